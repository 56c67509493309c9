pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while connecting to the spreadsheet or writing an expense to it.
///
/// `CredentialParse` and `ClientInit` only happen while the client is being constructed at startup
/// and are fatal. The other variants happen per message and are reported back to the user.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The service account credentials could not be parsed.
    #[error("Unable to parse the Google credentials JSON: {0}")]
    CredentialParse(#[source] std::io::Error),

    /// The authenticated client could not be created (network, auth rejection, ...).
    #[error("Unable to create the Google Sheets client: {0:#}")]
    ClientInit(#[source] anyhow::Error),

    /// The spreadsheet has no tabs.
    #[error("No worksheets found in the spreadsheet")]
    NoWorksheets,

    /// No row in the first column contains the sentinel text.
    #[error("Could not find the '{sentinel}' row in worksheet '{worksheet}'")]
    SentinelNotFound { worksheet: String, sentinel: String },

    /// Any error coming from the spreadsheet transport.
    #[error("{0:#}")]
    Sheet(#[from] anyhow::Error),
}
