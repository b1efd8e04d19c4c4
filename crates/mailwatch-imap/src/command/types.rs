//! Command-related type definitions.

/// Parenthesized FETCH item list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItems(pub(crate) Vec<FetchAttribute>);

impl FetchItems {
    /// UID plus the full raw message, without setting `\Seen`.
    #[must_use]
    pub fn uid_and_body_peek() -> Self {
        Self(vec![
            FetchAttribute::Uid,
            FetchAttribute::Body {
                section: None,
                peek: true,
            },
        ])
    }
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// UID.
    Uid,
    /// Body section.
    Body {
        /// Section specifier.
        section: Option<String>,
        /// Peek (don't set \Seen).
        peek: bool,
    },
}
