use shopdesk_auth::{Principal, PrincipalId, Role};

/// Principal context for a request (identity + role supplied by the gateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, role: Role) -> Self {
        Self {
            principal: Principal::new(principal_id, role),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal.id
    }

    pub fn role(&self) -> &Role {
        &self.principal.role
    }
}
