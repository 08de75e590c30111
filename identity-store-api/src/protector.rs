/// Reversible transform applied to personal data columns.
///
/// `protect` runs before a value is written, `unprotect` after it is read.
/// Lookups on protected columns compare protected values, so an
/// implementation must be deterministic for those lookups to match.
pub trait PersonalDataProtector: Send + Sync {
    fn protect(&self, data: &str) -> String;
    fn unprotect(&self, data: &str) -> String;
}
