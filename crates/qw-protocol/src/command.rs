use bytes::Bytes;

/// A single decoded message inside a sequenced packet.
///
/// The set is closed: the proxy only distinguishes the two text messages it
/// polices and carries everything else as the exact bytes it arrived as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `clc_stringcmd`: console text sent from the client to the server.
    StringCmd(StringCmd),
    /// `svc_stufftext`: console commands the server pushes to the client.
    Stufftext(Stufftext),
    /// Any other message (or undecoded remainder), kept verbatim including its
    /// message id.
    Other(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringCmd {
    pub text: String,
}

impl StringCmd {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stufftext {
    pub text: String,
}

impl Stufftext {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<StringCmd> for Command {
    fn from(cmd: StringCmd) -> Self {
        Command::StringCmd(cmd)
    }
}

impl From<Stufftext> for Command {
    fn from(cmd: Stufftext) -> Self {
        Command::Stufftext(cmd)
    }
}
