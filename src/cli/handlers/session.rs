//! `login`, `logout` and `whoami`

use anyhow::Result;

use super::super::CliContext;
use super::api_failure;
use crate::errors::ErrorMessages;
use crate::services::AuthService;

pub struct SessionHandler<'a> {
    context: &'a CliContext,
}

impl<'a> SessionHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    fn auth(&self) -> Result<AuthService> {
        Ok(AuthService::new(self.context.api_client()?))
    }

    pub async fn handle_login(&self, email: &str, password: &str) -> Result<()> {
        let auth = self
            .auth()?
            .login(email, password)
            .await
            .map_err(|e| api_failure(e, ErrorMessages::login))?;

        match auth.user {
            Some(user) => println!("Signed in as {} (id {})", user.email, user.id),
            None => println!("Signed in"),
        }
        Ok(())
    }

    pub async fn handle_logout(&self) -> Result<()> {
        self.auth()?
            .logout()
            .await
            .map_err(|e| api_failure(e, ErrorMessages::unknown))?;
        println!("Signed out");
        Ok(())
    }

    pub fn handle_whoami(&self) -> Result<()> {
        let auth = self.auth()?;
        if !auth.is_authenticated() {
            println!("Not signed in");
            return Ok(());
        }

        match auth.current_user() {
            Some(user) => {
                println!("{} (id {})", user.email, user.id);
                if let Some(role) = user.role {
                    println!("Role: {role}");
                }
            }
            None => println!("Signed in, no user record stored"),
        }
        Ok(())
    }
}

super::traits::impl_context_handler!(SessionHandler<'a>);
