/// Login handshake step labels
///
/// Each step of the login handshake depends on state only the previous live response
/// can supply, so the steps always run in this order.
use std::fmt;

/// One step of the login handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginStep {
    /// First unauthenticated GET that hands out the session id
    Probe,

    /// Same GET again, now presenting the session cookie bundle
    Reprobe,

    /// Locating the POST form and its numeric action id
    LoginForm,

    /// Fetching the captcha image from the verify endpoint
    Verify,

    /// Staging and recognizing the captcha image
    Captcha,

    /// Posting credentials and the captcha code
    Submit,

    /// Writing the new session to the store
    Persist,
}

impl LoginStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Reprobe => "reprobe",
            Self::LoginForm => "login_form",
            Self::Verify => "verify",
            Self::Captcha => "captcha",
            Self::Submit => "submit",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
