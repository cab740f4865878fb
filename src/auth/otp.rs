use rand::Rng;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::store::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    AccountVerify,
    PasswordReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("no OTP pending")]
    NotFound,
    #[error("OTP expired")]
    Expired,
    #[error("OTP mismatch")]
    Mismatch,
}

/// Issues and checks one-time codes stored on the user record. The engine
/// only mutates the record; persisting the result is the caller's job.
#[derive(Debug, Clone, Copy)]
pub struct OtpEngine {
    verify_ttl: Duration,
    reset_ttl: Duration,
}

impl OtpEngine {
    pub fn new(verify_ttl: Duration, reset_ttl: Duration) -> Self {
        Self {
            verify_ttl,
            reset_ttl,
        }
    }

    fn ttl(&self, purpose: OtpPurpose) -> Duration {
        match purpose {
            OtpPurpose::AccountVerify => self.verify_ttl,
            OtpPurpose::PasswordReset => self.reset_ttl,
        }
    }

    fn slots(
        user: &mut UserRecord,
        purpose: OtpPurpose,
    ) -> (&mut Option<String>, &mut Option<OffsetDateTime>) {
        match purpose {
            OtpPurpose::AccountVerify => (&mut user.verify_otp, &mut user.verify_otp_expires_at),
            OtpPurpose::PasswordReset => (&mut user.reset_otp, &mut user.reset_otp_expires_at),
        }
    }

    /// Generates a fresh code for the purpose, replacing any outstanding one.
    /// Only the most recent code per purpose is ever valid.
    pub fn issue(&self, user: &mut UserRecord, purpose: OtpPurpose) -> String {
        let code = generate_code();
        let expires_at = OffsetDateTime::now_utc() + self.ttl(purpose);
        let (code_slot, expiry_slot) = Self::slots(user, purpose);
        *code_slot = Some(code.clone());
        *expiry_slot = Some(expires_at);
        code
    }

    /// Checks a submitted code against the pending one. Success and expiry
    /// both consume the stored code; a mismatch leaves it pending so the
    /// user can retry until it expires.
    pub fn verify(
        &self,
        user: &mut UserRecord,
        purpose: OtpPurpose,
        submitted: &str,
    ) -> Result<(), OtpError> {
        let now = OffsetDateTime::now_utc();
        let (code_slot, expiry_slot) = Self::slots(user, purpose);

        // An empty stored code counts as "nothing pending".
        let code = match code_slot.as_deref() {
            None | Some("") => return Err(OtpError::NotFound),
            Some(c) => c.to_owned(),
        };

        // Codes are issued together with their expiry; a code without one is
        // unusable and gets dropped.
        let Some(expires_at) = *expiry_slot else {
            *code_slot = None;
            return Err(OtpError::NotFound);
        };

        if now > expires_at {
            *code_slot = None;
            *expiry_slot = None;
            return Err(OtpError::Expired);
        }

        // String comparison: "000000" is a valid six-digit code, not zero.
        if code != submitted {
            return Err(OtpError::Mismatch);
        }

        *code_slot = None;
        *expiry_slot = None;
        Ok(())
    }
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
