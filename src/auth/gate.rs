use uuid::Uuid;

use crate::users::model::User;

/// The parts of an authenticated user that authorization looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub is_superuser: bool,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            is_superuser: user.is_superuser,
        }
    }
}

/// Which rows a listing or count query may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    All,
    Owner(Uuid),
}

impl OwnerScope {
    pub fn for_identity(identity: Identity) -> Self {
        if identity.is_superuser {
            OwnerScope::All
        } else {
            OwnerScope::Owner(identity.id)
        }
    }

    pub fn owner(self) -> Option<Uuid> {
        match self {
            OwnerScope::All => None,
            OwnerScope::Owner(id) => Some(id),
        }
    }

    /// In-process form of the SQL filter, for stores that are not Postgres.
    #[cfg(test)]
    pub fn includes(self, owner_id: Uuid) -> bool {
        self.owner().map_or(true, |id| id == owner_id)
    }
}

fn owns_or_superuser(identity: Identity, owner_id: Uuid) -> bool {
    identity.is_superuser || identity.id == owner_id
}

pub fn can_read(identity: Identity, owner_id: Uuid) -> bool {
    owns_or_superuser(identity, owner_id)
}

pub fn can_write(identity: Identity, owner_id: Uuid) -> bool {
    owns_or_superuser(identity, owner_id)
}

pub fn can_delete(identity: Identity, owner_id: Uuid) -> bool {
    owns_or_superuser(identity, owner_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn owner_may_act_on_own_resource_only() {
        let me = Identity { id: id(5), is_superuser: false };
        for check in [can_read, can_write, can_delete] {
            assert!(check(me, id(5)));
            assert!(!check(me, id(7)));
        }
    }

    #[test]
    fn superuser_bypasses_ownership() {
        let root = Identity { id: id(1), is_superuser: true };
        for check in [can_read, can_write, can_delete] {
            assert!(check(root, id(5)));
            assert!(check(root, id(7)));
            assert!(check(root, id(1)));
        }
    }

    #[test]
    fn listing_scope_follows_role() {
        let me = Identity { id: id(2), is_superuser: false };
        let root = Identity { id: id(1), is_superuser: true };
        assert_eq!(OwnerScope::for_identity(me), OwnerScope::Owner(id(2)));
        assert_eq!(OwnerScope::for_identity(root), OwnerScope::All);
        assert!(OwnerScope::Owner(id(2)).includes(id(2)));
        assert!(!OwnerScope::Owner(id(2)).includes(id(1)));
        assert!(OwnerScope::All.includes(id(9)));
    }
}
