/// Source of per-session client identifiers
pub trait ClientIdGenerator: Send {
    fn next_id(&mut self) -> String;
}

/// Random identifiers of the form `client_` + 9 lowercase alphanumerics
#[derive(Debug, Default)]
pub struct RandomClientIds;

impl ClientIdGenerator for RandomClientIds {
    fn next_id(&mut self) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        format!("client_{}", &token[..9])
    }
}
