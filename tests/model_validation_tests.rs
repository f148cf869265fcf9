use members_board::{
    models::{LoginForm, MessageForm, NewUser, SignUpForm},
    repository::{MemoryRepository, Repository},
    validation::{
        FieldError, LOGIN_CHECKS, MESSAGE_CHECKS, SIGN_UP_CHECKS, USERNAME_TAKEN, Validated,
        ValidationFailure, escape_html, validate,
    },
};
use tokio::test;

// --- Test Data Helpers ---

fn sign_up_form(first: &str, last: &str, username: &str, password: &str) -> SignUpForm {
    SignUpForm {
        first_name: first.to_string(),
        last_name: last.to_string(),
        username: username.to_string(),
        password: password.to_string(),
    }
}

fn expect_invalid<F: std::fmt::Debug>(outcome: Validated<F>) -> ValidationFailure {
    match outcome {
        Validated::Invalid(failure) => failure,
        Validated::Valid(form) => panic!("expected validation to fail, got {:?}", form),
    }
}

fn expect_valid<F>(outcome: Validated<F>) -> F {
    match outcome {
        Validated::Valid(form) => form,
        Validated::Invalid(failure) => panic!("expected validation to pass, got {:?}", failure),
    }
}

async fn seed_user(repo: &MemoryRepository, username: &str) {
    repo.create_user(NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        username: username.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
    })
    .await
    .unwrap();
}

// --- Sign-up ---

#[test]
async fn test_valid_sign_up_is_trimmed() {
    let repo = MemoryRepository::new();
    let form = sign_up_form("  Ada ", "Lovelace  ", " ada1815 ", "  analytical-engine  ");

    let form = expect_valid(validate(form, SIGN_UP_CHECKS, &repo).await.unwrap());

    assert_eq!(form.first_name, "Ada");
    assert_eq!(form.last_name, "Lovelace");
    assert_eq!(form.username, "ada1815");
    assert_eq!(form.password, "analytical-engine");
}

#[test]
async fn test_short_password_fails_regardless_of_other_fields() {
    let repo = MemoryRepository::new();
    let form = sign_up_form("Ada", "Lovelace", "ada1815", "123456789");

    let failure = expect_invalid(validate(form, SIGN_UP_CHECKS, &repo).await.unwrap());

    assert_eq!(
        failure.errors,
        vec![FieldError {
            field: "password",
            message: "Password must be at least 10 characters",
        }]
    );
}

#[test]
async fn test_password_is_trimmed_before_length_check() {
    let repo = MemoryRepository::new();
    let form = sign_up_form("Ada", "Lovelace", "ada1815", "   short    ");

    let failure = expect_invalid(validate(form, SIGN_UP_CHECKS, &repo).await.unwrap());
    assert_eq!(failure.errors[0].field, "password");
}

#[test]
async fn test_errors_accumulate_in_field_order_and_keep_values() {
    let repo = MemoryRepository::new();
    let form = sign_up_form("", "Sm1th", "ok", "short");

    let failure = expect_invalid(validate(form, SIGN_UP_CHECKS, &repo).await.unwrap());

    let fields: Vec<&str> = failure.errors.iter().map(|e| e.field).collect();
    assert_eq!(fields, vec!["first_name", "last_name", "password"]);

    // An empty first name stops at the length rule; it is not also reported as non-alphabetic.
    assert_eq!(
        failure.messages(),
        vec![
            "First name must be between 1 and 30 characters",
            "Last name must only contain letters",
            "Password must be at least 10 characters",
        ]
    );

    // Submitted values survive for re-rendering, the password does not.
    assert_eq!(failure.value("last_name"), "Sm1th");
    assert_eq!(failure.value("username"), "ok");
    assert_eq!(failure.value("password"), "");
    assert!(failure.values.iter().all(|(field, _)| *field != "password"));
}

#[test]
async fn test_username_length_and_charset() {
    let repo = MemoryRepository::new();

    let too_long = sign_up_form("Ada", "Lovelace", &"a".repeat(31), "analytical-engine");
    let failure = expect_invalid(validate(too_long, SIGN_UP_CHECKS, &repo).await.unwrap());
    assert_eq!(
        failure.messages(),
        vec!["Username must be between 1 and 30 characters"]
    );

    let symbols = sign_up_form("Ada", "Lovelace", "ada_1815", "analytical-engine");
    let failure = expect_invalid(validate(symbols, SIGN_UP_CHECKS, &repo).await.unwrap());
    assert_eq!(
        failure.messages(),
        vec!["Username must only contain letters and numbers"]
    );
}

#[test]
async fn test_existing_username_fails_validation() {
    let repo = MemoryRepository::new();
    seed_user(&repo, "ada1815").await;

    let form = sign_up_form("Other", "Person", "ada1815", "analytical-engine");
    let failure = expect_invalid(validate(form, SIGN_UP_CHECKS, &repo).await.unwrap());

    assert_eq!(failure.messages(), vec![USERNAME_TAKEN]);
    assert_eq!(repo.user_count().await, 1);
}

// --- Messages ---

#[test]
async fn test_message_markup_is_escaped() {
    let repo = MemoryRepository::new();
    let form = MessageForm {
        title: " <b>Hi</b> ".to_string(),
        text: "Tom & \"Jerry\"".to_string(),
    };

    let form = expect_valid(validate(form, MESSAGE_CHECKS, &repo).await.unwrap());

    assert_eq!(form.title, "&lt;b&gt;Hi&lt;&#x2F;b&gt;");
    assert_eq!(form.text, "Tom &amp; &quot;Jerry&quot;");
}

#[test]
async fn test_message_length_limits() {
    let repo = MemoryRepository::new();

    let at_limit = MessageForm {
        title: "t".repeat(30),
        text: "x".repeat(300),
    };
    expect_valid(validate(at_limit, MESSAGE_CHECKS, &repo).await.unwrap());

    let over_limit = MessageForm {
        title: "t".repeat(31),
        text: "x".repeat(301),
    };
    let failure = expect_invalid(validate(over_limit, MESSAGE_CHECKS, &repo).await.unwrap());
    assert_eq!(
        failure.messages(),
        vec![
            "Title must be between 1 and 30 characters",
            "Message must be between 1 and 300 characters",
        ]
    );
}

#[test]
async fn test_blank_message_fails() {
    let repo = MemoryRepository::new();
    let form = MessageForm {
        title: "   ".to_string(),
        text: "".to_string(),
    };

    let failure = expect_invalid(validate(form, MESSAGE_CHECKS, &repo).await.unwrap());
    assert_eq!(failure.errors.len(), 2);
}

// --- Login ---

#[test]
async fn test_login_requires_both_fields() {
    let repo = MemoryRepository::new();
    let form = LoginForm {
        username: "  ".to_string(),
        password: "".to_string(),
    };

    let failure = expect_invalid(validate(form, LOGIN_CHECKS, &repo).await.unwrap());
    assert_eq!(
        failure.messages(),
        vec!["Username must be specified", "Password must be specified"]
    );
}

#[test]
async fn test_escape_html() {
    assert_eq!(escape_html("plain text"), "plain text");
    assert_eq!(
        escape_html(r#"<script>alert('x')</script>"#),
        "&lt;script&gt;alert(&#x27;x&#x27;)&lt;&#x2F;script&gt;"
    );
    assert_eq!(escape_html("a\\b`c"), "a&#x5C;b&#96;c");
}
