use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;

use tollgate_auth::{
    Action, AuthConfig, AuthError, AuthnError, Authenticator, Authorizer, AuthzError, CredentialStore, HashParams,
    InMemoryCredentialStore, ManualClock, NewPrincipal, PasswordHasher, PermissionTable, PrincipalId, PrincipalPatch,
    Registrar, Role, StoreError, TokenService, bearer_token,
};

const SECRET: &str = "integration-test-secret-integration-test";

struct Kernel {
    clock: Arc<ManualClock>,
    registrar: Registrar<Arc<InMemoryCredentialStore>>,
    authenticator: Authenticator<Arc<InMemoryCredentialStore>>,
    authorizer: Authorizer,
}

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(HashParams {
        cost: HashParams::MIN_COST,
        memory_kib: HashParams::MIN_MEMORY_KIB,
    })
    .unwrap()
}

fn kernel() -> Kernel {
    let clock = Arc::new(ManualClock::new(start()));
    let store = Arc::new(InMemoryCredentialStore::new());

    let mut config = AuthConfig::new(SECRET);
    config.token_ttl = std::time::Duration::from_secs(3600);
    let tokens = TokenService::with_clock(&config, clock.clone()).unwrap();

    Kernel {
        clock,
        registrar: Registrar::new(store.clone(), cheap_hasher()),
        authenticator: Authenticator::new(store, cheap_hasher(), tokens.clone()).unwrap(),
        authorizer: Authorizer::new(tokens, PermissionTable::canonical()),
    }
}

fn new_principal(id: &str, identifier: &str, secret: &str, role: Role) -> NewPrincipal {
    NewPrincipal {
        id: PrincipalId::from(id),
        identifier: identifier.to_string(),
        secret: secret.to_string(),
        display_name: format!("Principal {id}"),
        role,
    }
}

fn mint(secret: &str, claims: serde_json::Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn login_scenario() {
    let k = kernel();
    k.registrar
        .register(new_principal("1", "a@x.com", "pw123", Role::User))
        .unwrap();

    let token = k.authenticator.authenticate("a@x.com", "pw123").unwrap();
    let claims = k.authenticator.tokens().verify(&token).unwrap();
    let stored = k.registrar.store().get(&PrincipalId::from("1")).unwrap();
    assert_eq!(claims.role(), Some(stored.role));
    assert_eq!(claims.identifier, "a@x.com");

    assert_eq!(
        k.authenticator.authenticate("a@x.com", "wrong").unwrap_err(),
        AuthnError::InvalidCredentials
    );
}

#[test]
fn wrong_secret_and_unknown_account_look_the_same_at_the_boundary() {
    let k = kernel();
    k.registrar
        .register(new_principal("1", "a@x.com", "pw123", Role::User))
        .unwrap();

    let wrong: AuthError = k.authenticator.authenticate("a@x.com", "nope").unwrap_err().into();
    let missing: AuthError = k.authenticator.authenticate("ghost@x.com", "nope").unwrap_err().into();

    assert_eq!(wrong, missing);
    assert_eq!(wrong.code(), missing.code());
    assert_eq!(wrong.status_code(), 401);
    assert_eq!(wrong.to_string(), missing.to_string());
}

#[test]
fn issued_token_authorizes_until_expiry() {
    let k = kernel();
    k.registrar
        .register(new_principal("1", "a@x.com", "pw123", Role::User))
        .unwrap();
    let token = k.authenticator.authenticate("a@x.com", "pw123").unwrap();
    let header = format!("Bearer {token}");
    let own = PrincipalId::from("1");

    k.clock.advance(Duration::seconds(3599));
    let claims = k
        .authorizer
        .authorize(bearer_token(Some(&header)), Action::Update, Some(&own))
        .unwrap();
    assert_eq!(claims.subject_id, own);

    k.clock.advance(Duration::seconds(1));
    assert_eq!(
        k.authorizer
            .authorize(bearer_token(Some(&header)), Action::Update, Some(&own))
            .unwrap_err(),
        AuthzError::Unauthenticated
    );
}

#[test]
fn user_and_admin_capabilities() {
    let k = kernel();
    k.registrar
        .register(new_principal("1", "admin@x.com", "root-pw", Role::Admin))
        .unwrap();
    k.registrar
        .register(new_principal("2", "user@x.com", "user-pw", Role::User))
        .unwrap();

    let admin = k.authenticator.authenticate("admin@x.com", "root-pw").unwrap();
    let user = k.authenticator.authenticate("user@x.com", "user-pw").unwrap();
    let user_id = PrincipalId::from("2");
    let admin_id = PrincipalId::from("1");

    // Admin deletes anybody, including the user.
    assert!(k.authorizer.authorize(Some(&admin), Action::Delete, Some(&user_id)).is_ok());
    assert!(k.authorizer.authorize(Some(&admin), Action::Create, None).is_ok());

    // User manages only their own record and cannot list or create.
    assert!(k.authorizer.authorize(Some(&user), Action::Read, Some(&user_id)).is_ok());
    assert_eq!(
        k.authorizer.authorize(Some(&user), Action::Delete, Some(&admin_id)).unwrap_err(),
        AuthzError::Unauthorized
    );
    assert_eq!(
        k.authorizer.authorize(Some(&user), Action::Read, None).unwrap_err(),
        AuthzError::Unauthorized
    );
    assert_eq!(
        k.authorizer.authorize(Some(&user), Action::Create, None).unwrap_err(),
        AuthzError::Unauthorized
    );
}

#[test]
fn role_change_applies_to_new_tokens_only() {
    let k = kernel();
    k.registrar
        .register(new_principal("2", "user@x.com", "user-pw", Role::User))
        .unwrap();
    let before = k.authenticator.authenticate("user@x.com", "user-pw").unwrap();

    let promote = PrincipalPatch::role(Role::Admin);
    k.registrar.update(&PrincipalId::from("2"), promote).unwrap();
    let after = k.authenticator.authenticate("user@x.com", "user-pw").unwrap();

    assert!(k.authorizer.authorize(Some(&before), Action::Create, None).is_err());
    assert!(k.authorizer.authorize(Some(&after), Action::Create, None).is_ok());
}

#[test]
fn changed_secret_replaces_the_old_one() {
    let k = kernel();
    k.registrar
        .register(new_principal("1", "a@x.com", "pw123", Role::User))
        .unwrap();
    k.registrar.change_secret(&PrincipalId::from("1"), "pw456").unwrap();

    assert!(k.authenticator.authenticate("a@x.com", "pw123").is_err());
    assert!(k.authenticator.authenticate("a@x.com", "pw456").is_ok());
}

#[test]
fn forged_tokens_are_rejected() {
    let k = kernel();
    let now = start().timestamp();
    let claims = json!({
        "subjectId": "1",
        "identifier": "a@x.com",
        "role": "admin",
        "issuedAt": now,
        "expiresAt": now + 600,
    });

    let foreign = mint("some-other-secret-some-other-secret", claims.clone());
    assert_eq!(
        k.authorizer.authorize(Some(&foreign), Action::Read, None).unwrap_err(),
        AuthzError::Unauthenticated
    );

    let genuine = mint(SECRET, claims);
    assert!(k.authorizer.authorize(Some(&genuine), Action::Read, None).is_ok());
}

#[test]
fn validly_signed_token_with_unknown_role_is_unauthorized() {
    let k = kernel();
    let now = start().timestamp();
    let token = mint(
        SECRET,
        json!({
            "subjectId": "1",
            "identifier": "a@x.com",
            "role": "superuser",
            "issuedAt": now,
            "expiresAt": now + 600,
        }),
    );

    let owner = PrincipalId::from("1");
    assert_eq!(
        k.authorizer.authorize(Some(&token), Action::Read, Some(&owner)).unwrap_err(),
        AuthzError::Unauthorized
    );
}

#[test]
fn token_missing_a_field_is_unauthenticated() {
    let k = kernel();
    let now = start().timestamp();
    let token = mint(
        SECRET,
        json!({ "subjectId": "1", "role": "admin", "issuedAt": now, "expiresAt": now + 600 }),
    );
    assert_eq!(
        k.authorizer.authorize(Some(&token), Action::Read, None).unwrap_err(),
        AuthzError::Unauthenticated
    );
}

#[test]
fn deleted_principal_cannot_log_in() {
    let k = kernel();
    k.registrar
        .register(new_principal("1", "a@x.com", "pw123", Role::User))
        .unwrap();
    let id = PrincipalId::from("1");
    k.registrar.store().delete(&id).unwrap();

    assert_eq!(k.registrar.store().get(&id).unwrap_err(), StoreError::NotFound);
    assert_eq!(
        k.authenticator.authenticate("a@x.com", "pw123").unwrap_err(),
        AuthnError::InvalidCredentials
    );
}

#[test]
fn concurrent_creates_of_one_id_admit_exactly_one() {
    const THREADS: usize = 16;

    let store = Arc::new(InMemoryCredentialStore::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let registrar = Registrar::new(store, cheap_hasher());
                barrier.wait();
                registrar.register(new_principal("1", &format!("p{i}@x.com"), "pw", Role::User))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::AlreadyExists)))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(conflicts, THREADS - 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn concurrent_updates_see_latest_state() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 50;

    let store = Arc::new(InMemoryCredentialStore::new());
    Registrar::new(store.clone(), cheap_hasher())
        .register(new_principal("1", "a@x.com", "pw", Role::User))
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for r in 0..ROUNDS {
                    store
                        .update(&PrincipalId::from("1"), PrincipalPatch::display_name(format!("{t}-{r}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let records = store.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.as_str(), "1");
    assert!(records[0].display_name.ends_with(&format!("-{}", ROUNDS - 1)));
}
