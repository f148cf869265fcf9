/// Router Module Index
///
/// Splits the board's pages by the audience the Authorization Gate admits. The gate itself
/// runs inside each handler (the same check for GET and POST), so these modules only group
/// the paths; they never layer their own access checks.

/// Pages open to every visitor, plus the guest-only sign-up and login pages.
pub mod public;

/// Pages that require a signed-in user. Guests are redirected to the index.
pub mod authenticated;

/// Pages restricted to users with the admin flag.
pub mod admin;
