//! Command Line Limits and Protocol Tokens

// ===== LINE BUFFER =====

/// Maximum characters buffered for one command line.
pub const MAX_COMMANDLINE_LENGTH: usize = 512;

/// Maximum length of a command word or a single argument.
pub const MAX_COMMANDPART_LENGTH: usize = 36;

/// Maximum number of KEY=VALUE arguments on one line.
pub const MAX_NUM_ARGUMENTS: usize = 6;

/// Size of the buffer used to format one outgoing message.
pub const SIZE_TOSTRING_BUFFER: usize = 512;

// ===== TOKENS =====

/// Optional prefix on argument keys (`--INPUT=3`).
pub const KEY_VALUE_PAIR_FLAG: &str = "--";

/// Separator between key and value.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Channel list token selecting every input.
pub const PARAMETER_ALL: &str = "ALL";

/// Channel list set separator (`1,4,7`).
pub const SET_DELIMITER: char = ',';

/// Channel list range separator (`2-9`).
pub const RANGE_DELIMITER: char = '-';

// ===== CONTROL CHARACTERS =====

/// Backspace.
pub const BACKSPACE: u8 = 0x08;

/// Delete, treated like backspace.
pub const DELETE: u8 = 0x7F;

/// ASCII unit separator ending each exported record.
pub const RECORD_TERMINATOR: char = '\u{1F}';

/// ASCII record separator ending each exported batch or message.
pub const BATCH_TERMINATOR: char = '\u{1E}';
