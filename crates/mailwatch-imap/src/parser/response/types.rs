//! Response data types.

use crate::types::{Capability, ResponseCode, SeqNum, Uid};

/// FETCH response item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// RFC822 size.
    Rfc822Size(u32),
    /// UID.
    Uid(Uid),
    /// BODY section.
    Body {
        /// Section specifier (`None` for the whole message).
        section: Option<String>,
        /// Body data.
        data: Option<Vec<u8>>,
    },
}

/// Untagged server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// OK response with optional code.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// NO response.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BAD response.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// PREAUTH response.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BYE response.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY response.
    Capability(Vec<Capability>),
    /// EXISTS response (message count).
    Exists(u32),
    /// RECENT response.
    Recent(u32),
    /// EXPUNGE response (message removed).
    Expunge(SeqNum),
    /// FETCH response.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Fetch data items.
        items: Vec<FetchItem>,
    },
    /// Any other untagged data, keyed by its name (`FLAGS`, `LIST`, ...).
    Other(String),
}

impl UntaggedResponse {
    /// Returns the body and UID of a FETCH response, if it carried them.
    #[must_use]
    pub fn fetched_body(&self) -> Option<(SeqNum, Option<Uid>, &[u8])> {
        let Self::Fetch { seq, items } = self else {
            return None;
        };
        let mut uid = None;
        let mut body = None;
        for item in items {
            match item {
                FetchItem::Uid(u) => uid = Some(*u),
                FetchItem::Body {
                    section: None,
                    data: Some(data),
                } => body = Some(data.as_slice()),
                _ => {}
            }
        }
        body.map(|b| (*seq, uid, b))
    }
}
