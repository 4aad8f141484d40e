// Application layer: ports (interfaces) and the use case driving the
// standardization pipeline end to end.

pub mod ports;
pub mod process_use_case;
