use secrecy::SecretString;

// -------------------------------------------------------------------------------------------------
// Auth
// -------------------------------------------------------------------------------------------------
/// Supported forms of authentication against a source-code host
pub enum Auth {
    /// No authentication
    Unauthenticated,

    /// `Authorization: Bearer <token>` (GitHub)
    Bearer(SecretString),

    /// `PRIVATE-TOKEN: <token>` (GitLab)
    PrivateToken(SecretString),

    /// `Authorization: token <token>` (Gitea)
    Token(SecretString),

    /// HTTP basic authentication with a username and an app password or token (Bitbucket)
    Basic {
        username: String,
        password: SecretString,
    },
}
