//! Registry and invocation messages

use std::fmt;

use bytes::{BufMut, Bytes};

use super::codec::{self, CodecError};
use super::constants::*;

/// A playback command sent to a remote host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackCommand {
    Play,
    Pause,
    /// Seek to the start of the media, then play
    Restart,
}

impl PlaybackCommand {
    pub const ALL: [PlaybackCommand; 3] = [
        PlaybackCommand::Play,
        PlaybackCommand::Pause,
        PlaybackCommand::Restart,
    ];

    pub fn code(self) -> u8 {
        match self {
            PlaybackCommand::Play => CMD_PLAY,
            PlaybackCommand::Pause => CMD_PAUSE,
            PlaybackCommand::Restart => CMD_RESTART,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            CMD_PLAY => Some(PlaybackCommand::Play),
            CMD_PAUSE => Some(PlaybackCommand::Pause),
            CMD_RESTART => Some(PlaybackCommand::Restart),
            _ => None,
        }
    }

    /// Name of the remote operation this command invokes
    pub fn operation(self) -> &'static str {
        match self {
            PlaybackCommand::Play => "playVideo",
            PlaybackCommand::Pause => "pauseVideo",
            PlaybackCommand::Restart => "restartVideo",
        }
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackCommand::Play => "play",
            PlaybackCommand::Pause => "pause",
            PlaybackCommand::Restart => "restart",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for PlaybackCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" | "playvideo" => Ok(PlaybackCommand::Play),
            "pause" | "pausevideo" => Ok(PlaybackCommand::Pause),
            "restart" | "restartvideo" => Ok(PlaybackCommand::Restart),
            other => Err(format!("unknown command `{}`", other)),
        }
    }
}

/// Client to registry request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// List bound service names (also used as a liveness probe)
    List,
    /// Check that a service name is bound
    Lookup { name: String },
    /// Invoke a playback operation on a bound service
    Invoke {
        name: String,
        command: PlaybackCommand,
    },
}

impl Request {
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        let buf = match self {
            Request::List => codec::begin_body(OP_LIST),
            Request::Lookup { name } => {
                let mut buf = codec::begin_body(OP_LOOKUP);
                codec::put_string(&mut buf, name)?;
                buf
            }
            Request::Invoke { name, command } => {
                let mut buf = codec::begin_body(OP_INVOKE);
                codec::put_string(&mut buf, name)?;
                buf.put_u8(command.code());
                buf
            }
        };
        Ok(buf.freeze())
    }

    pub fn decode(body: Bytes) -> Result<Self, CodecError> {
        let (opcode, mut payload) = codec::open_body(body)?;
        match opcode {
            OP_LIST => Ok(Request::List),
            OP_LOOKUP => Ok(Request::Lookup {
                name: codec::get_string(&mut payload)?,
            }),
            OP_INVOKE => {
                let name = codec::get_string(&mut payload)?;
                let code = codec::get_u8(&mut payload)?;
                let command =
                    PlaybackCommand::from_code(code).ok_or(CodecError::UnknownCommand(code))?;
                Ok(Request::Invoke { name, command })
            }
            other => Err(CodecError::UnknownOpcode(other)),
        }
    }
}

/// Registry to client response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    Names(Vec<String>),
    NotBound(String),
    /// The service raised an error while handling the call
    Fault(String),
}

impl Response {
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        let buf = match self {
            Response::Ok => codec::begin_body(OP_OK),
            Response::Names(names) => {
                let mut buf = codec::begin_body(OP_NAMES);
                let count = u16::try_from(names.len())
                    .map_err(|_| CodecError::FrameTooLarge(names.len()))?;
                buf.put_u16(count);
                for name in names {
                    codec::put_string(&mut buf, name)?;
                }
                buf
            }
            Response::NotBound(name) => {
                let mut buf = codec::begin_body(OP_NOT_BOUND);
                codec::put_string(&mut buf, name)?;
                buf
            }
            Response::Fault(message) => {
                let mut buf = codec::begin_body(OP_FAULT);
                codec::put_string(&mut buf, message)?;
                buf
            }
        };
        Ok(buf.freeze())
    }

    pub fn decode(body: Bytes) -> Result<Self, CodecError> {
        let (opcode, mut payload) = codec::open_body(body)?;
        match opcode {
            OP_OK => Ok(Response::Ok),
            OP_NAMES => {
                let count = codec::get_u16(&mut payload)? as usize;
                let mut names = Vec::with_capacity(count);
                for _ in 0..count {
                    names.push(codec::get_string(&mut payload)?);
                }
                Ok(Response::Names(names))
            }
            OP_NOT_BOUND => Ok(Response::NotBound(codec::get_string(&mut payload)?)),
            OP_FAULT => Ok(Response::Fault(codec::get_string(&mut payload)?)),
            other => Err(CodecError::UnknownOpcode(other)),
        }
    }
}
