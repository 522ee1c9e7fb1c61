/// Classic magic ("YAZ0")
pub const YAZ0_MAGIC: [u8; 4] = *b"Yaz0";

/// Alternate-header magic ("YAZ1"); identical token stream
pub const YAZ1_MAGIC: [u8; 4] = *b"Yaz1";

/// Container header size (magic + decoded size + 8 reserved bytes)
pub const HEADER_SIZE: usize = 16;

/// Farthest a back-reference may reach behind the write cursor
pub const WINDOW_SIZE: usize = 0x1000; // 4KB

/// Shortest back-reference worth emitting
pub const MIN_MATCH_LEN: usize = 3;

/// Longest back-reference expressible in the 2-byte form
pub const MAX_SHORT_MATCH_LEN: usize = 0x11; // 17

/// Longest back-reference expressible at all (3-byte form)
pub const MAX_MATCH_LEN: usize = 0x111; // 273

/// Tokens covered by one flag byte
pub const GROUP_SIZE: usize = 8;
