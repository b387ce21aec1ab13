use core::fmt;

/// Operations an expander cannot perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AnalogWrite,
    AnalogRead,
    ServoWrite,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::AnalogWrite => "analogWrite",
            Operation::AnalogRead => "analogRead",
            Operation::ServoWrite => "servoWrite",
        }
    }
}

/// Problems found while resolving the construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No controller was given, or its name is not a known chip family.
    InvalidController,
    /// A directly supplied descriptor has an unusable port layout.
    InvalidDescriptor,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidController => f.write_str("Expander expects a valid controller"),
            ConfigError::InvalidDescriptor => {
                f.write_str("Expander descriptor must have one or two ports")
            }
        }
    }
}

/// Errors returned by the expander, generic over the transport error `E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    Configuration(ConfigError),
    /// The chip family has no such capability.  Never touches the bus.
    Unsupported {
        operation: Operation,
        controller: &'static str,
    },
    Transport(E),
    InvalidPin(u8),
    InvalidMode(u8),
    /// `initialize()` has not completed successfully.
    NotReady,
    /// The pin already holds the maximum number of read listeners.
    ListenerCapacity(u8),
    /// No room for another lifecycle listener.
    EventCapacity,
    /// A read completion carried no data.
    ShortRead(u8),
    /// The transport accepted the read but has not delivered the result yet.
    ReadPending(u8),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(e: ConfigError) -> Self {
        Error::Configuration(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(e) => e.fmt(f),
            Error::Unsupported {
                operation,
                controller,
            } => write!(
                f,
                "Expander:{} does not support {}",
                controller,
                operation.as_str()
            ),
            Error::Transport(e) => write!(f, "transport error: {:?}", e),
            Error::InvalidPin(pin) => write!(f, "pin {} does not exist on this expander", pin),
            Error::InvalidMode(mode) => write!(f, "mode {} is not supported", mode),
            Error::NotReady => f.write_str("expander is not initialized"),
            Error::ListenerCapacity(pin) => write!(f, "too many read listeners on pin {}", pin),
            Error::EventCapacity => f.write_str("too many event listeners"),
            Error::ShortRead(pin) => write!(f, "empty read completion for pin {}", pin),
            Error::ReadPending(pin) => write!(f, "read of pin {} has not completed", pin),
        }
    }
}

impl<E: fmt::Debug> embedded_hal::digital::Error for Error<E> {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}
