//! Category permissions derived from group membership. Matching is
//! case-insensitive and ignores any `@domain` suffix, so the same group
//! grants the capability whether the server returned the short or the
//! fully-qualified name. UX-only; real access control lives on the API.

/// Groups whose members may edit account names.
pub const NAME_EDIT_GROUPS: &[&str] = &[
    "idm_people_write_priv",
    "idm_hp_people_write_priv",
    "idm_admins",
];

/// Groups whose members may edit mail attributes.
pub const EMAIL_EDIT_GROUPS: &[&str] = &[
    "idm_people_extend_priv",
    "idm_hp_people_extend_priv",
    "idm_admins",
];

/// Groups whose members may edit their own mail attributes.
pub const SELF_WRITE_GROUPS: &[&str] = &["idm_people_self_write_mail_priv", "idm_all_persons"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Permissions {
    pub name_allowed: bool,
    pub email_allowed: bool,
    pub self_write_allowed: bool,
}

/// Derives the category permissions from an identity's group list.
pub fn permissions_for(member_of: &[String]) -> Permissions {
    Permissions {
        name_allowed: intersects(member_of, NAME_EDIT_GROUPS),
        email_allowed: intersects(member_of, EMAIL_EDIT_GROUPS),
        self_write_allowed: intersects(member_of, SELF_WRITE_GROUPS),
    }
}

fn intersects(member_of: &[String], allowed: &[&str]) -> bool {
    member_of.iter().any(|group| {
        let short = group.split('@').next().unwrap_or(group).to_ascii_lowercase();
        allowed.contains(&short.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::permissions_for;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn no_groups_grants_nothing() {
        let permissions = permissions_for(&[]);
        assert!(!permissions.name_allowed);
        assert!(!permissions.email_allowed);
        assert!(!permissions.self_write_allowed);
    }

    #[test]
    fn matching_ignores_case_and_domain_suffix() {
        let bare = permissions_for(&groups(&["idm_people_write_priv"]));
        let suffixed = permissions_for(&groups(&["idm_people_write_priv@idm.example.com"]));
        let shouting = permissions_for(&groups(&["IDM_People_Write_Priv@IDM.EXAMPLE.COM"]));
        assert!(bare.name_allowed);
        assert_eq!(bare, suffixed);
        assert_eq!(bare, shouting);
    }

    #[test]
    fn capabilities_are_independent() {
        let permissions = permissions_for(&groups(&[
            "idm_people_extend_priv@idm.example.com",
            "idm_all_persons",
        ]));
        assert!(!permissions.name_allowed);
        assert!(permissions.email_allowed);
        assert!(permissions.self_write_allowed);
    }

    #[test]
    fn admins_may_edit_names_and_mail() {
        let permissions = permissions_for(&groups(&["idm_admins"]));
        assert!(permissions.name_allowed);
        assert!(permissions.email_allowed);
        assert!(!permissions.self_write_allowed);
    }

    #[test]
    fn unrelated_domains_do_not_leak_matches() {
        let permissions = permissions_for(&groups(&["someone_elses_group@idm.example.com"]));
        assert_eq!(permissions, super::Permissions::default());
    }
}
