use members_board::{
    AppConfig,
    authz::{Access, Elevation, MessageVisibility, Route, elevate, gate},
    models::User,
};

fn user(membership: bool, admin: bool) -> User {
    User {
        username: "someone".to_string(),
        membership,
        admin,
        ..User::default()
    }
}

const ALL_ROUTES: [Route; 5] = [
    Route::SignUp,
    Route::Login,
    Route::Profile,
    Route::SendMessage,
    Route::Delete,
];

#[test]
fn test_guest_access() {
    for route in ALL_ROUTES {
        let expected = match route {
            Route::Profile | Route::SendMessage | Route::Delete => Access::Redirect("/"),
            _ => Access::Allow,
        };
        assert_eq!(gate(None, route), expected, "guest on {:?}", route);
    }
}

#[test]
fn test_signed_in_non_admin_access() {
    for viewer in [user(false, false), user(true, false)] {
        for route in ALL_ROUTES {
            let expected = match route {
                Route::SignUp | Route::Login | Route::Delete => Access::Redirect("/"),
                _ => Access::Allow,
            };
            assert_eq!(gate(Some(&viewer), route), expected, "user on {:?}", route);
        }
    }
}

#[test]
fn test_admin_access() {
    let admin = user(false, true);
    assert_eq!(gate(Some(&admin), Route::Delete), Access::Allow);
    assert_eq!(gate(Some(&admin), Route::Profile), Access::Allow);
    assert_eq!(gate(Some(&admin), Route::Login), Access::Redirect("/"));
}

#[test]
fn test_elevation_is_independent() {
    let config = AppConfig::default();

    assert_eq!(
        elevate(&config.member_passphrase, "", &config),
        Elevation {
            membership: true,
            admin: false
        }
    );
    assert_eq!(
        elevate("", &config.admin_passphrase, &config),
        Elevation {
            membership: false,
            admin: true
        }
    );
    assert_eq!(
        elevate(&config.member_passphrase, &config.admin_passphrase, &config),
        Elevation {
            membership: true,
            admin: true
        }
    );
    assert_eq!(elevate("nope", "nope", &config), Elevation::default());
}

#[test]
fn test_passphrases_are_not_interchangeable() {
    let config = AppConfig::default();
    let swapped = elevate(&config.admin_passphrase, &config.member_passphrase, &config);
    assert!(!swapped.grants_anything());
}

#[test]
fn test_near_miss_passphrases_are_refused() {
    let config = AppConfig::default();
    let secret = config.member_passphrase.clone();

    let prefix = &secret[..secret.len() - 1];
    let extended = format!("{}x", secret);
    let doubled = secret.repeat(2);
    let mut last_byte_changed = secret.clone();
    last_byte_changed.pop();
    last_byte_changed.push('#');

    for attempt in [prefix, extended.as_str(), doubled.as_str(), last_byte_changed.as_str()] {
        assert!(
            !elevate(attempt, "", &config).membership,
            "{:?} should not match",
            attempt
        );
    }

    // Surrounding whitespace is trimmed before the comparison.
    assert!(elevate(&format!("  {} ", secret), "", &config).membership);
}

#[test]
fn test_empty_secret_never_matches() {
    let mut config = AppConfig::default();
    config.member_passphrase = String::new();
    assert!(!elevate("", "", &config).membership);
}

#[test]
fn test_elevation_changes() {
    let member = user(true, false);
    let grant_member = Elevation {
        membership: true,
        admin: false,
    };
    let grant_admin = Elevation {
        membership: false,
        admin: true,
    };
    assert!(!grant_member.changes(&member));
    assert!(grant_admin.changes(&member));
}

#[test]
fn test_message_visibility_by_tier() {
    assert_eq!(MessageVisibility::for_viewer(None), MessageVisibility::default());
    assert_eq!(
        MessageVisibility::for_viewer(Some(&user(false, false))),
        MessageVisibility::default()
    );
    assert_eq!(
        MessageVisibility::for_viewer(Some(&user(true, false))),
        MessageVisibility {
            show_author: true,
            show_timestamp: true,
            can_delete: false
        }
    );
    assert_eq!(
        MessageVisibility::for_viewer(Some(&user(true, true))),
        MessageVisibility {
            show_author: true,
            show_timestamp: true,
            can_delete: true
        }
    );
}
