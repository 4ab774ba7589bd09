/// State transitions on a blood request.
///
/// These are the only way a request's status changes once it is posted.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestAction {
    /// A donor accepted the request.
    ///
    /// # Errors
    /// Fails unless the request is still `OPEN`.
    Fulfil { donor_id: String },
    /// The requester withdrew the request.
    ///
    /// # Errors
    /// Fails unless the request is still `OPEN`.
    Cancel,
}
