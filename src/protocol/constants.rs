//! Wire protocol constants

/// Protocol version carried in every frame body
pub const PROTOCOL_VERSION: u8 = 1;

/// Registry port used when none is given (same default as the classic RMI registry)
pub const DEFAULT_REGISTRY_PORT: u16 = 1099;

/// Size of the frame length prefix
pub const FRAME_HEADER_SIZE: usize = 4;

/// Largest accepted frame body
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

// Request opcodes
pub const OP_LIST: u8 = 0x01;
pub const OP_LOOKUP: u8 = 0x02;
pub const OP_INVOKE: u8 = 0x03;

// Response opcodes
pub const OP_OK: u8 = 0x80;
pub const OP_NAMES: u8 = 0x81;
pub const OP_NOT_BOUND: u8 = 0x82;
pub const OP_FAULT: u8 = 0x83;

// Command codes
pub const CMD_PLAY: u8 = 1;
pub const CMD_PAUSE: u8 = 2;
pub const CMD_RESTART: u8 = 3;
