//! A scripted in-memory IMAP server for exercising the listener end to end.
//!
//! Each connection made through [`FakeImap::transport`] gets its own server
//! task over a [`tokio::io::duplex`] pipe. All connections share one mailbox,
//! so messages delivered between sessions are visible to the next one.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailwatch_core::{ConnectionConfig, ListenerSettings, Transport};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, Lines,
};
use tokio::sync::watch;
use tokio::time::Instant;

/// How one connection behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
    /// Greets, authenticates and idles.
    #[default]
    Normal,
    /// The transport refuses the connection.
    Refuse,
    /// LOGIN is answered with NO.
    RejectLogin,
    /// IDLE is never advertised.
    NoIdle,
    /// Accepts the connection but never greets.
    Silent,
}

/// How an idling connection is torn down by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Untagged BYE, then close.
    Bye,
    /// Close without a word.
    Eof,
}

#[derive(Default)]
struct State {
    messages: Vec<String>,
    log: Vec<String>,
    script: VecDeque<Behavior>,
    fallback: Behavior,
    disconnect: Option<Disconnect>,
    connects: Vec<Instant>,
    reverse_fetch: bool,
    expunge_on_done: Option<usize>,
}

struct Inner {
    state: Mutex<State>,
    kick: watch::Sender<u64>,
    open: AtomicUsize,
    max_open: AtomicUsize,
}

impl Inner {
    fn record(&self, entry: impl Into<String>) {
        self.state.lock().unwrap().log.push(entry.into());
    }

    fn exists(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    fn take_disconnect(&self) -> Option<Disconnect> {
        self.state.lock().unwrap().disconnect.take()
    }

    /// Removes the message queued by [`FakeImap::expunge_on_done`], if any.
    fn take_expunge(&self) -> Option<usize> {
        let mut state = self.state.lock().unwrap();
        let seq = state.expunge_on_done.take()?;
        state.messages.remove(seq - 1);
        Some(seq)
    }
}

/// Handle to the fake server, shared by the test and its transport.
#[derive(Clone)]
pub struct FakeImap {
    inner: Arc<Inner>,
}

impl Default for FakeImap {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeImap {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                kick: watch::channel(0).0,
                open: AtomicUsize::new(0),
                max_open: AtomicUsize::new(0),
            }),
        }
    }

    /// Puts messages in the mailbox without announcing them.
    pub fn preload<'a>(self, messages: impl IntoIterator<Item = &'a str>) -> Self {
        self.inner
            .state
            .lock()
            .unwrap()
            .messages
            .extend(messages.into_iter().map(str::to_string));
        self
    }

    /// Behaviors for the next connections, in order.
    pub fn script(&self, behaviors: impl IntoIterator<Item = Behavior>) {
        self.inner.state.lock().unwrap().script.extend(behaviors);
    }

    /// Behavior once the script is used up.
    pub fn fallback(&self, behavior: Behavior) {
        self.inner.state.lock().unwrap().fallback = behavior;
    }

    /// Answer FETCH with the highest sequence number first.
    pub fn reverse_fetch_order(&self) {
        self.inner.state.lock().unwrap().reverse_fetch = true;
    }

    /// Expunges message `seq` when the client next ends IDLE, reporting it
    /// between DONE and the tagged completion.
    pub fn expunge_on_done(&self, seq: usize) {
        self.inner.state.lock().unwrap().expunge_on_done = Some(seq);
    }

    /// Appends one message and announces it to an idling client.
    pub fn deliver(&self, raw: &str) {
        self.deliver_many([raw]);
    }

    /// Appends messages and announces them with a single EXISTS.
    pub fn deliver_many<'a>(&self, raws: impl IntoIterator<Item = &'a str>) {
        self.inner
            .state
            .lock()
            .unwrap()
            .messages
            .extend(raws.into_iter().map(str::to_string));
        self.inner.kick.send_modify(|n| *n += 1);
    }

    /// Drops the next (or current) idling connection.
    pub fn disconnect(&self, how: Disconnect) {
        self.inner.state.lock().unwrap().disconnect = Some(how);
        self.inner.kick.send_modify(|n| *n += 1);
    }

    /// Commands received so far, without tags or credentials.
    pub fn log(&self) -> Vec<String> {
        self.inner.state.lock().unwrap().log.clone()
    }

    /// How many logged commands start with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// When each connection was attempted.
    pub fn connects(&self) -> Vec<Instant> {
        self.inner.state.lock().unwrap().connects.clone()
    }

    /// Connections open right now.
    pub fn open(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Most connections ever open at once.
    pub fn max_open(&self) -> usize {
        self.inner.max_open.load(Ordering::SeqCst)
    }

    /// Waits until `prefix` has been received at least `n` times.
    pub async fn wait_for_command(&self, prefix: &str, n: usize) {
        within(async {
            while self.count(prefix) < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
    }

    /// Waits until at least `n` connections were attempted.
    pub async fn wait_for_connects(&self, n: usize) {
        within(async {
            while self.connects().len() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
    }

    pub fn transport(&self) -> FakeTransport {
        FakeTransport {
            server: self.clone(),
        }
    }

    fn next_behavior(&self) -> Behavior {
        let mut state = self.inner.state.lock().unwrap();
        state.connects.push(Instant::now());
        let fallback = state.fallback;
        state.script.pop_front().unwrap_or(fallback)
    }
}

/// Transport that connects to the fake server instead of the network.
#[derive(Clone)]
pub struct FakeTransport {
    server: FakeImap,
}

impl Transport for FakeTransport {
    type Stream = DuplexStream;

    async fn connect(
        &self,
        _config: &ConnectionConfig,
        _timeout: Duration,
    ) -> mailwatch_imap::Result<DuplexStream> {
        let behavior = self.server.next_behavior();
        if behavior == Behavior::Refuse {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into());
        }

        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(serve(Arc::clone(&self.server.inner), server, behavior));
        Ok(client)
    }
}

/// Credentials the fake server accepts.
pub fn config() -> ConnectionConfig {
    ConnectionConfig::new("imap.test", "watcher", "secret")
}

pub fn settings() -> ListenerSettings {
    ListenerSettings::default()
}

/// A minimal plain-text message.
pub fn email(subject: &str, body: &str) -> String {
    format!("From: a@example.com\r\nSubject: {subject}\r\nContent-Type: text/plain\r\n\r\n{body}")
}

/// Fails the test if `future` takes more than an hour of (virtual) time.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(3600), future)
        .await
        .unwrap()
}

async fn serve(inner: Arc<Inner>, stream: DuplexStream, behavior: Behavior) {
    let open = inner.open.fetch_add(1, Ordering::SeqCst) + 1;
    inner.max_open.fetch_max(open, Ordering::SeqCst);
    let _ = session(&inner, stream, behavior).await;
    inner.open.fetch_sub(1, Ordering::SeqCst);
}

enum IdleEnd {
    Done,
    Hangup,
}

async fn session(inner: &Inner, stream: DuplexStream, behavior: Behavior) -> io::Result<()> {
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();
    let mut kick = inner.kick.subscribe();

    if behavior == Behavior::Silent {
        while lines.next_line().await?.is_some() {}
        return Ok(());
    }

    let caps = if behavior == Behavior::NoIdle {
        "IMAP4rev1"
    } else {
        "IMAP4rev1 IDLE"
    };
    write
        .write_all(format!("* OK [CAPABILITY {caps}] fake server ready\r\n").as_bytes())
        .await?;

    let mut reported = 0;
    while let Some(line) = lines.next_line().await? {
        let (tag, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let (command, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let command = command.to_ascii_uppercase();
        if args.is_empty() || command == "LOGIN" {
            inner.record(command.clone());
        } else {
            inner.record(format!("{command} {args}"));
        }

        let reply = match command.as_str() {
            "CAPABILITY" => format!("* CAPABILITY {caps}\r\n{tag} OK done\r\n"),
            "LOGIN" if behavior == Behavior::RejectLogin => {
                format!("{tag} NO [AUTHENTICATIONFAILED] invalid credentials\r\n")
            }
            "LOGIN" => format!("{tag} OK logged in\r\n"),
            "EXAMINE" => {
                reported = inner.exists();
                format!(
                    "* {reported} EXISTS\r\n* 0 RECENT\r\n* FLAGS (\\Seen \\Answered)\r\n\
                     {tag} OK [READ-ONLY] examined\r\n"
                )
            }
            "FETCH" => fetch_reply(inner, tag, args),
            "CLOSE" => format!("{tag} OK closed\r\n"),
            "LOGOUT" => {
                write
                    .write_all(format!("* BYE logging out\r\n{tag} OK bye\r\n").as_bytes())
                    .await?;
                return Ok(());
            }
            "IDLE" => {
                write.write_all(b"+ idling\r\n").await?;
                match idle(inner, &mut lines, &mut write, &mut kick, &mut reported).await? {
                    IdleEnd::Done => format!("{tag} OK IDLE terminated\r\n"),
                    IdleEnd::Hangup => return Ok(()),
                }
            }
            _ => format!("{tag} BAD unknown command\r\n"),
        };
        write.write_all(reply.as_bytes()).await?;
    }
    Ok(())
}

async fn idle<R, W>(
    inner: &Inner,
    lines: &mut Lines<R>,
    write: &mut W,
    kick: &mut watch::Receiver<u64>,
    reported: &mut usize,
) -> io::Result<IdleEnd>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        if let Some(how) = inner.take_disconnect() {
            if how == Disconnect::Bye {
                write.write_all(b"* BYE server shutting down\r\n").await?;
            }
            return Ok(IdleEnd::Hangup);
        }
        let exists = inner.exists();
        if exists != *reported {
            *reported = exists;
            write
                .write_all(format!("* {exists} EXISTS\r\n").as_bytes())
                .await?;
        }

        tokio::select! {
            line = lines.next_line() => {
                return match line? {
                    Some(line) if line.eq_ignore_ascii_case("DONE") => {
                        inner.record("DONE");
                        if let Some(seq) = inner.take_expunge() {
                            *reported -= 1;
                            write.write_all(format!("* {seq} EXPUNGE\r\n").as_bytes()).await?;
                        }
                        Ok(IdleEnd::Done)
                    }
                    Some(other) => {
                        inner.record(other);
                        Ok(IdleEnd::Hangup)
                    }
                    None => Ok(IdleEnd::Hangup),
                };
            }
            changed = kick.changed() => {
                if changed.is_err() {
                    return Ok(IdleEnd::Hangup);
                }
            }
        }
    }
}

fn fetch_reply(inner: &Inner, tag: &str, args: &str) -> String {
    let set = args.split_whitespace().next().unwrap_or_default();
    let (first, last) = set.split_once(':').unwrap_or((set, set));
    let (Ok(first), Ok(last)) = (first.parse::<usize>(), last.parse::<usize>()) else {
        return format!("{tag} BAD bad sequence set\r\n");
    };

    let state = inner.state.lock().unwrap();
    let mut seqs: Vec<usize> = (first..=last.min(state.messages.len())).collect();
    if state.reverse_fetch {
        seqs.reverse();
    }

    let mut reply = String::new();
    for seq in seqs {
        let raw = &state.messages[seq - 1];
        reply.push_str(&format!(
            "* {seq} FETCH (UID {} BODY[] {{{}}}\r\n{raw})\r\n",
            100 + seq,
            raw.len()
        ));
    }
    reply.push_str(&format!("{tag} OK fetched\r\n"));
    reply
}
