//! Closed result taxonomy for control operations.
//!
//! The table below is the only place codes and messages are listed. The enum,
//! the numeric mapping and the message lookup are all generated from it, so a
//! code cannot exist without its message.

use serde::{Deserialize, Serialize};

/// Message returned for numeric values outside the table.
pub const UNKNOWN_MESSAGE: &str = "Unknown";

macro_rules! error_table {
    ($($(#[$doc:meta])* $name:ident = $value:literal => $message:literal,)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u32)]
        pub enum ErrorCode {
            $($(#[$doc])* $name = $value,)+
        }

        impl ErrorCode {
            /// Every defined code, in table order.
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$name,)+];

            pub const fn value(self) -> u32 {
                self as u32
            }

            pub const fn message(self) -> &'static str {
                match self {
                    $(ErrorCode::$name => $message,)+
                }
            }

            pub const fn from_value(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(ErrorCode::$name),)+
                    _ => None,
                }
            }
        }
    };
}

error_table! {
    /// Tick completed.
    Ok = 0 => "No Error",
    /// Temperature read failed; no actuation was attempted.
    SensorFailure = 10 => "Sensor Failure",
    /// Thrust request above twice the profile limit; register untouched.
    ThrustOutOfRange = 20 => "Thrust Out of Range",
    /// FAULT bit set in the control register.
    SystemFault = 30 => "System Fault",
}

/// How a caller should react to a non-OK code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    None,
    /// Retry the tick after remediation.
    Retryable,
    /// Bad input upstream; do not retry automatically.
    Reject,
    /// Clear the fault out of band before resuming.
    ClearFaultFirst,
}

impl ErrorCode {
    pub const fn is_ok(self) -> bool {
        matches!(self, ErrorCode::Ok)
    }

    pub const fn disposition(self) -> Disposition {
        match self {
            ErrorCode::Ok => Disposition::None,
            ErrorCode::SensorFailure => Disposition::Retryable,
            ErrorCode::ThrustOutOfRange => Disposition::Reject,
            ErrorCode::SystemFault => Disposition::ClearFaultFirst,
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.value(), self.message())
    }
}

/// Message lookup over raw numeric codes. Total: undefined values map to
/// [`UNKNOWN_MESSAGE`].
pub fn message_for(value: u32) -> &'static str {
    ErrorCode::from_value(value).map_or(UNKNOWN_MESSAGE, ErrorCode::message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_match_table() {
        assert_eq!(ErrorCode::Ok.value(), 0);
        assert_eq!(ErrorCode::SensorFailure.value(), 10);
        assert_eq!(ErrorCode::ThrustOutOfRange.value(), 20);
        assert_eq!(ErrorCode::SystemFault.value(), 30);
    }

    #[test]
    fn test_from_value_inverts_value() {
        for &code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_value(code.value()), Some(code));
        }
        assert_eq!(ErrorCode::from_value(11), None);
    }

    #[test]
    fn test_display_includes_value_and_message() {
        assert_eq!(ErrorCode::SystemFault.to_string(), "30: System Fault");
    }

    #[test]
    fn test_dispositions() {
        assert_eq!(ErrorCode::Ok.disposition(), Disposition::None);
        assert_eq!(ErrorCode::SensorFailure.disposition(), Disposition::Retryable);
        assert_eq!(ErrorCode::ThrustOutOfRange.disposition(), Disposition::Reject);
        assert_eq!(ErrorCode::SystemFault.disposition(), Disposition::ClearFaultFirst);
    }
}
