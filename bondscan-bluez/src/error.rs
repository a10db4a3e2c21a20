/*!
 * Error types for the BlueZ layer
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BluezError {
    #[error("D-Bus error: {0}")]
    DBus(#[from] dbus::Error),
}

/// Why a pair or unpair request failed, bucketed by the D-Bus error name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BondError {
    #[error("bond method not available ({name}): {message}")]
    MethodNotFound { name: String, message: String },

    #[error("bond call failed ({name}): {message}")]
    Invocation { name: String, message: String },

    #[error("bond call not permitted ({name}): {message}")]
    Access { name: String, message: String },
}

const NOT_FOUND_ERRORS: &[&str] = &[
    "org.freedesktop.DBus.Error.UnknownMethod",
    "org.freedesktop.DBus.Error.UnknownObject",
    "org.freedesktop.DBus.Error.UnknownInterface",
    "org.freedesktop.DBus.Error.ServiceUnknown",
    "org.bluez.Error.DoesNotExist",
];

const ACCESS_ERRORS: &[&str] = &[
    "org.freedesktop.DBus.Error.AccessDenied",
    "org.freedesktop.DBus.Error.AuthFailed",
    "org.freedesktop.DBus.Error.InteractiveAuthorizationRequired",
    "org.bluez.Error.NotAuthorized",
    "org.bluez.Error.NotPermitted",
];

impl BondError {
    pub fn classify(name: &str, message: &str) -> Self {
        let name_owned = name.to_string();
        let message = message.to_string();
        if NOT_FOUND_ERRORS.contains(&name) {
            BondError::MethodNotFound { name: name_owned, message }
        } else if ACCESS_ERRORS.contains(&name) {
            BondError::Access { name: name_owned, message }
        } else {
            BondError::Invocation { name: name_owned, message }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BondError::MethodNotFound { .. } => "method-not-found",
            BondError::Invocation { .. } => "invocation",
            BondError::Access { .. } => "access",
        }
    }
}

impl From<dbus::Error> for BondError {
    fn from(error: dbus::Error) -> Self {
        BondError::classify(
            error.name().unwrap_or("org.freedesktop.DBus.Error.Failed"),
            error.message().unwrap_or(""),
        )
    }
}
