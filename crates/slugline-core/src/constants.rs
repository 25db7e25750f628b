/// Words no slug may equal unless configuration says otherwise.
pub const DEFAULT_RESERVED_WORDS: [&str; 2] = ["new", "edit"];

pub const DEFAULT_MAX_CONNECTIONS: u8 = 4;
pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// Separator between a scope's collection and its discriminating value in scope keys.
pub const SCOPE_KEY_SEPARATOR: char = '|';
