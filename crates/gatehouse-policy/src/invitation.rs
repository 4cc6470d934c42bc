//! Invitation lifecycle — issuance, acceptance, and reaping.

use chrono::{Duration, Utc};
use gatehouse_core::error::{GatehouseError, GatehouseResult};
use gatehouse_core::models::invitation::{CreateInvitation, Invitation};
use gatehouse_core::models::user::{AccountStatus, CreateUser, UpdateUser, User};
use gatehouse_core::repository::{InvitationRepository, RoleRepository, UserRepository};
use tracing::info;
use uuid::Uuid;

use crate::config::PolicyConfig;
use crate::error::PolicyError;
use crate::token;

/// Account details supplied by the invitee when redeeming a token.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub display_name: String,
    /// Raw password; validated against the configured minimum length
    /// and hashed before storage.
    pub password: String,
}

/// Lowercase-and-trim normalization applied to every email before it
/// is stored or compared.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Invitation service.
///
/// Generic over repository implementations so the lifecycle logic has
/// no dependency on the database crate.
pub struct InvitationService<I, R, U>
where
    I: InvitationRepository,
    R: RoleRepository,
    U: UserRepository,
{
    invitations: I,
    roles: R,
    users: U,
    config: PolicyConfig,
}

impl<I, R, U> InvitationService<I, R, U>
where
    I: InvitationRepository,
    R: RoleRepository,
    U: UserRepository,
{
    pub fn new(invitations: I, roles: R, users: U, config: PolicyConfig) -> Self {
        Self {
            invitations,
            roles,
            users,
            config,
        }
    }

    /// Issue a single-use, time-boxed invitation binding `email` to a
    /// proposed role set.
    ///
    /// Returns the stored invitation together with the raw token; the
    /// token is not recoverable afterwards, only its hash is kept.
    pub async fn issue(
        &self,
        email: &str,
        role_ids: Vec<Uuid>,
        invited_by: Uuid,
        ttl: Option<Duration>,
    ) -> GatehouseResult<(Invitation, String)> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(GatehouseError::Validation {
                message: format!("not an email address: {email}"),
            });
        }

        // Every proposed role must exist at issue time.
        for role_id in &role_ids {
            self.roles.get_by_id(*role_id).await?;
        }

        let raw_token = token::generate_invite_token();
        let token_hash = token::hash_invite_token(&raw_token);
        let ttl =
            ttl.unwrap_or_else(|| Duration::seconds(self.config.invitation_ttl_secs as i64));
        let expires_at = Utc::now() + ttl;

        let invitation = self
            .invitations
            .create(CreateInvitation {
                email: email.clone(),
                token_hash,
                role_ids,
                invited_by,
                expires_at,
            })
            .await?;

        info!(%email, %invited_by, %expires_at, "invitation issued");
        Ok((invitation, raw_token))
    }

    /// Redeem an invitation token, creating (or activating) the
    /// subject and binding the proposed roles to it.
    ///
    /// Expiry is re-checked here independently of the reaper: a
    /// physically present but expired record is still rejected.
    pub async fn accept(&self, raw_token: &str, account: NewAccount) -> GatehouseResult<User> {
        let token_hash = token::hash_invite_token(raw_token);
        let invitation = match self.invitations.get_by_token_hash(&token_hash).await {
            Ok(invitation) => invitation,
            Err(GatehouseError::NotFound { .. }) => {
                return Err(PolicyError::TokenNotFound.into());
            }
            Err(other) => return Err(other),
        };

        if Utc::now() > invitation.expires_at {
            return Err(PolicyError::TokenExpired.into());
        }
        if invitation.accepted {
            return Err(PolicyError::AlreadyAccepted.into());
        }

        if account.password.chars().count() < self.config.min_password_length {
            return Err(PolicyError::PasswordTooShort {
                min: self.config.min_password_length,
            }
            .into());
        }

        let user = match self.users.get_by_email(&invitation.email).await {
            // A previously invited, still-pending account is claimed.
            Ok(existing) if existing.status == AccountStatus::Pending => {
                self.users
                    .update(
                        existing.id,
                        UpdateUser {
                            display_name: Some(account.display_name),
                            status: Some(AccountStatus::Active),
                            password: Some(account.password),
                            ..Default::default()
                        },
                    )
                    .await?
            }
            Ok(_) => {
                return Err(GatehouseError::AlreadyExists {
                    entity: format!("user {}", invitation.email),
                });
            }
            Err(GatehouseError::NotFound { .. }) => {
                let created = self
                    .users
                    .create(CreateUser {
                        email: invitation.email.clone(),
                        display_name: account.display_name,
                        password: account.password,
                    })
                    .await?;
                self.users
                    .update(
                        created.id,
                        UpdateUser {
                            status: Some(AccountStatus::Active),
                            ..Default::default()
                        },
                    )
                    .await?
            }
            Err(other) => return Err(other),
        };

        for role_id in &invitation.role_ids {
            self.users.assign_role(user.id, *role_id).await?;
        }

        self.invitations.mark_accepted(invitation.id).await?;

        info!(email = %invitation.email, user_id = %user.id, "invitation accepted");
        Ok(user)
    }

    /// Hard-delete invitations past their expiry, accepted or not.
    ///
    /// Advisory cleanup invoked on a schedule; `accept` does not rely
    /// on it for correctness.
    pub async fn reap_expired(&self) -> GatehouseResult<u64> {
        let purged = self.invitations.delete_expired(Utc::now()).await?;
        if purged > 0 {
            info!(purged, "expired invitations reaped");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased_and_trimmed() {
        assert_eq!(normalize_email("  Jane.Doe@School.EDU "), "jane.doe@school.edu");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }
}
