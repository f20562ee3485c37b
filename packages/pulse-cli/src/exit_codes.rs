pub const SUCCESS: i32 = 0;
/// Bad arguments, unreadable input, or data the operation rejects
pub const INPUT_ERROR: i32 = 2;
/// Failure while producing or writing the result
pub const EXECUTION_ERROR: i32 = 3;
