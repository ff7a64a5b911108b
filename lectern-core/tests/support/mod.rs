#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use lectern_core::{
    Actor, AuditInterceptor, RequestContext,
    auth::{PasswordCrypto, TokenService, TokenSettings},
    database::Repositories,
    domain::{Credentials, Services},
    model::{Role, User},
};
use zeroize::Zeroizing;

pub struct Harness {
    pub repos: Repositories,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        let repos = Repositories::in_memory(AuditInterceptor::default());
        let crypto = Arc::new(
            PasswordCrypto::insecure_fast("test-pepper")
                .expect("pepper accepted"),
        );
        let tokens = TokenService::new(&TokenSettings {
            access_secret: Zeroizing::new("access-secret-for-tests".into()),
            refresh_secret: Zeroizing::new("refresh-secret-for-tests".into()),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(3600),
        })
        .expect("token settings accepted");
        let services = Services::new(&repos, crypto, tokens);
        Self { repos, services }
    }

    /// Register an account and return a context acting as it.
    pub async fn sign_up(
        &self,
        username: &str,
        role: Role,
    ) -> (User, RequestContext) {
        let user = self
            .services
            .auth
            .register(
                &RequestContext::anonymous(),
                &Credentials::new(username, "hunter2").with_role(role),
            )
            .await
            .expect("registration succeeds");
        let ctx = RequestContext::for_actor(Actor::new(user.id, user.role));
        (user, ctx)
    }
}
