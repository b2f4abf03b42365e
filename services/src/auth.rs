use db::models::user;

/// The identity the authentication collaborator attaches to each
/// request: the user's id plus their display name at request time.
/// Services trust these as given.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
}

impl AuthUser {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<&user::Model> for AuthUser {
    fn from(user: &user::Model) -> Self {
        Self::new(user.id, user.username.clone())
    }
}
