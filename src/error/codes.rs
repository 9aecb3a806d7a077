/// Error code registry for Cadence
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Session errors
/// - 4000-4999: Execution errors
/// - 6000-6999: Git errors
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;
    pub const CONFIG_INVALID_RANGE: u16 = 1004;
    pub const CONFIG_INVALID_COMMIT_COUNT: u16 = 1005;

    // Session errors (2000-2999)
    pub const SESSION_BUSY: u16 = 2001;
    pub const SESSION_NOT_ACTIVE: u16 = 2002;
    pub const SESSION_LEDGER: u16 = 2003;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_TIMEOUT: u16 = 4002;
    pub const EXEC_SPAWN_FAILED: u16 = 4005;
    pub const EXEC_RUN_ABORTED: u16 = 4006;

    // Git errors (6000-6999)
    pub const GIT_NOT_REPO: u16 = 6001;
    pub const GIT_NOTHING_TO_COMMIT: u16 = 6002;
    pub const GIT_COMMIT_NOT_FOUND: u16 = 6003;
    pub const GIT_DETACHED_HEAD: u16 = 6004;
    pub const GIT_COMMAND_FAILED: u16 = 6005;
    pub const GIT_SYNC_FAILED: u16 = 6006;
    pub const GIT_INVALID_PATH: u16 = 6007;
    pub const GIT_DIRTY: u16 = 6008;

    // Validation errors (7000-7999)
    pub const VALIDATION_FAILED: u16 = 7001;
    pub const VALIDATION_RISKY: u16 = 7002;

    // Other errors (9000-9999)
    pub const OTHER_IO: u16 = 9001;
}
