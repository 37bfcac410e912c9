use super::test_db;
use crate::DbError;
use crate::credentials::StoredCredentials;

fn creds(token: &str, secret: Option<&str>) -> StoredCredentials {
    StoredCredentials {
        client_id: "client".into(),
        access_token: token.into(),
        client_secret: secret.map(str::to_string),
    }
}

#[test]
fn test_save_and_load_credentials() {
    let db = test_db();
    db.save_credentials(&creds("abc", Some("s3cret"))).unwrap();

    let got = db.get_credentials().unwrap().unwrap();
    assert_eq!(got, creds("abc", Some("s3cret")));
}

#[test]
fn test_save_without_secret_keeps_previous_secret() {
    let db = test_db();
    db.save_credentials(&creds("abc", Some("s3cret"))).unwrap();
    db.save_credentials(&creds("def", None)).unwrap();

    let got = db.get_credentials().unwrap().unwrap();
    assert_eq!(got.access_token, "def");
    assert_eq!(got.client_secret.as_deref(), Some("s3cret"));
}

#[test]
fn test_clear_credentials() {
    let db = test_db();
    db.save_credentials(&creds("abc", None)).unwrap();
    db.clear_credentials().unwrap();
    assert!(db.get_credentials().unwrap().is_none());
}

#[test]
fn test_empty_client_id_rejected() {
    let db = test_db();
    let mut bad = creds("abc", None);
    bad.client_id.clear();
    assert!(matches!(
        db.save_credentials(&bad),
        Err(DbError::InvalidData(_))
    ));
}
