//! Café provisioning and recoverable user flows
//!
//! Invite-gated creation of new cafés plus the small flows that report
//! inline outcomes instead of raising: feedback submission and PIN
//! changes. A creation code is single-use and expires; redeeming it,
//! creating the café and seeding its first manager and table happen in
//! one flow with a compensating café delete when seeding fails.

use crate::error::{ActionResult, ClientError, ClientResult};
use crate::state::CafeCollections;
use crate::store::StoreGateway;
use chrono::Utc;
use shared::models::{Cafe, CafeTable, CreationCode, Feedback, FeedbackCreate, Staff, StaffRole, StaffUpdate};
use shared::realtime::ChangeEvent;
use shared::util::is_valid_pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Everything seeded for a freshly provisioned café
#[derive(Debug, Clone)]
pub struct ProvisionedCafe {
    pub cafe: Cafe,
    pub manager: Staff,
    pub first_table: CafeTable,
}

/// Outcome of a provisioning attempt; rejection reasons are data.
#[derive(Debug)]
pub enum ProvisionOutcome {
    Created(Box<ProvisionedCafe>),
    Rejected(ActionResult),
}

/// Provisioning and inline-outcome flows
pub struct ProvisioningService {
    gateway: Arc<dyn StoreGateway>,
    collections: Arc<RwLock<CafeCollections>>,
}

impl ProvisioningService {
    pub fn new(
        gateway: Arc<dyn StoreGateway>,
        collections: Arc<RwLock<CafeCollections>>,
    ) -> Self {
        Self {
            gateway,
            collections,
        }
    }

    /// Issue a fresh creation code (platform-admin side).
    pub async fn issue_creation_code(&self) -> ClientResult<CreationCode> {
        let code = self.gateway.insert_creation_code(CreationCode::issue()).await?;
        tracing::info!(code_id = %code.id, "Creation code issued");
        Ok(code)
    }

    /// Redeem a creation code and provision a café with its first
    /// manager and table. The code is consumed before the café is
    /// created; a failure while seeding rolls the café back.
    pub async fn provision_cafe(
        &self,
        code: &str,
        cafe_name: &str,
        manager_name: &str,
        manager_pin: &str,
    ) -> ClientResult<ProvisionOutcome> {
        if cafe_name.trim().is_empty() {
            return Ok(ProvisionOutcome::Rejected(ActionResult::fail(
                "Café name is required",
                "INVALID_NAME",
            )));
        }
        if !is_valid_pin(manager_pin) {
            return Ok(ProvisionOutcome::Rejected(ActionResult::fail(
                "Manager PIN must be exactly 6 digits",
                "INVALID_PIN",
            )));
        }
        let Some(found) = self.gateway.find_creation_code(code).await? else {
            return Ok(ProvisionOutcome::Rejected(ActionResult::fail(
                "Unknown creation code",
                "INVALID_CODE",
            )));
        };
        if !found.is_redeemable(Utc::now()) {
            let result = if found.used {
                ActionResult::fail("This code was already used", "CODE_USED")
            } else {
                ActionResult::fail("This code has expired", "CODE_EXPIRED")
            };
            return Ok(ProvisionOutcome::Rejected(result));
        }

        self.gateway.mark_code_used(&found.id).await?;
        let cafe = self
            .gateway
            .insert_cafe(Cafe {
                id: Uuid::new_v4().to_string(),
                name: cafe_name.to_string(),
                hidden: false,
            })
            .await?;

        match self.seed_cafe(&cafe, manager_name, manager_pin).await {
            Ok((manager, first_table)) => {
                tracing::info!(cafe_id = %cafe.id, "Café provisioned");
                Ok(ProvisionOutcome::Created(Box::new(ProvisionedCafe {
                    cafe,
                    manager,
                    first_table,
                })))
            }
            Err(e) => {
                tracing::error!(cafe_id = %cafe.id, error = %e, "Seeding failed, rolling café back");
                // Best effort: the caller gets the seeding error either way
                if let Err(rollback) = self.gateway.delete_cafe(&cafe.id).await {
                    tracing::error!(cafe_id = %cafe.id, error = %rollback, "Café rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn seed_cafe(
        &self,
        cafe: &Cafe,
        manager_name: &str,
        manager_pin: &str,
    ) -> ClientResult<(Staff, CafeTable)> {
        let manager = self
            .gateway
            .insert_staff(Staff {
                id: Uuid::new_v4().to_string(),
                cafe_id: cafe.id.clone(),
                name: manager_name.to_string(),
                role: StaffRole::Manager,
                pin: manager_pin.to_string(),
                phone: None,
            })
            .await?;
        let first_table = self
            .gateway
            .insert_table(CafeTable {
                id: Uuid::new_v4().to_string(),
                cafe_id: cafe.id.clone(),
                name: "Mesa 1".to_string(),
                hidden: false,
            })
            .await?;
        Ok((manager, first_table))
    }

    // ===== Inline-outcome flows =====

    /// Submit feedback; validation failures come back inline.
    pub async fn submit_feedback(&self, create: FeedbackCreate) -> ClientResult<ActionResult> {
        if create.content.trim().is_empty() {
            return Ok(ActionResult::fail("Feedback text is empty", "EMPTY_CONTENT"));
        }
        if create.rating.is_some_and(|r| !(1..=5).contains(&r)) {
            return Ok(ActionResult::fail(
                "Rating must be between 1 and 5",
                "INVALID_RATING",
            ));
        }
        let feedback = Feedback {
            id: Uuid::new_v4().to_string(),
            content: create.content,
            rating: create.rating,
            cafe_id: create.cafe_id,
            staff_id: create.staff_id,
            resolved: false,
            created_at: Utc::now(),
        };
        let stored = self.gateway.insert_feedback(feedback).await?;
        tracing::info!(feedback_id = %stored.id, "Feedback submitted");
        self.collections
            .write()
            .await
            .apply_feedback(ChangeEvent::Insert { new: stored });
        Ok(ActionResult::ok("Thank you for your feedback"))
    }

    /// Mark a feedback entry handled (or reopen it).
    pub async fn resolve_feedback(&self, id: &str, resolved: bool) -> ClientResult<Feedback> {
        let stored = self.gateway.set_feedback_resolved(id, resolved).await?;
        self.collections
            .write()
            .await
            .apply_feedback(ChangeEvent::Update {
                new: stored.clone(),
            });
        Ok(stored)
    }

    /// Change a staff member's own PIN after re-verifying the current
    /// one. Format and uniqueness failures come back inline.
    pub async fn change_pin(
        &self,
        staff_id: &str,
        current_pin: &str,
        new_pin: &str,
    ) -> ClientResult<ActionResult> {
        {
            let guard = self.collections.read().await;
            let staff = guard
                .staff
                .iter()
                .find(|s| s.id == staff_id)
                .ok_or_else(|| ClientError::NotFound(format!("staff {staff_id}")))?;
            if staff.pin != current_pin {
                return Ok(ActionResult::fail("Current PIN is incorrect", "WRONG_PIN"));
            }
            if !is_valid_pin(new_pin) {
                return Ok(ActionResult::fail(
                    "PIN must be exactly 6 digits",
                    "INVALID_PIN",
                ));
            }
            if guard.staff.iter().any(|s| s.pin == new_pin && s.id != staff_id) {
                return Ok(ActionResult::fail(
                    "PIN already in use by another staff member",
                    "PIN_TAKEN",
                ));
            }
        }

        let stored = self
            .gateway
            .update_staff(
                staff_id,
                StaffUpdate {
                    pin: Some(new_pin.to_string()),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(staff_id = %staff_id, "PIN changed");
        self.collections
            .write()
            .await
            .apply_staff(ChangeEvent::Update { new: stored });
        Ok(ActionResult::ok("PIN updated"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::flaky::FlakyGateway;
    use crate::store::MemoryGateway;
    use chrono::Duration;
    use shared::models::CODE_VALIDITY_MINUTES;

    fn service() -> ProvisioningService {
        ProvisioningService::new(
            Arc::new(MemoryGateway::new()),
            Arc::new(RwLock::new(CafeCollections::default())),
        )
    }

    #[tokio::test]
    async fn test_provision_seeds_manager_and_table() {
        let svc = service();
        let code = svc.issue_creation_code().await.unwrap();

        let outcome = svc
            .provision_cafe(&code.code, "Mesa Uno", "Ana", "123456")
            .await
            .unwrap();
        let ProvisionOutcome::Created(p) = outcome else {
            panic!("expected provisioning to succeed");
        };
        assert_eq!(p.cafe.name, "Mesa Uno");
        assert_eq!(p.manager.role, StaffRole::Manager);
        assert_eq!(p.manager.cafe_id, p.cafe.id);
        assert_eq!(p.first_table.name, "Mesa 1");

        let staff = svc.gateway.list_staff(&p.cafe.id).await.unwrap();
        assert_eq!(staff.len(), 1);
    }

    #[tokio::test]
    async fn test_seeding_failure_rolls_the_cafe_back() {
        let gateway = Arc::new(FlakyGateway::new());
        let svc = ProvisioningService::new(
            Arc::clone(&gateway) as Arc<dyn StoreGateway>,
            Arc::new(RwLock::new(CafeCollections::default())),
        );
        let code = svc.issue_creation_code().await.unwrap();

        gateway.fail_on("insert_table");
        let err = svc
            .provision_cafe(&code.code, "Mesa Uno", "Ana", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Store(ref msg) if msg.contains("insert_table")));
        // The compensating delete removed the half-provisioned café
        assert!(gateway.inner.list_cafes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_rollback_still_reports_the_seeding_error() {
        let gateway = Arc::new(FlakyGateway::new());
        let svc = ProvisioningService::new(
            Arc::clone(&gateway) as Arc<dyn StoreGateway>,
            Arc::new(RwLock::new(CafeCollections::default())),
        );
        let code = svc.issue_creation_code().await.unwrap();

        gateway.fail_on("insert_table");
        gateway.fail_on("delete_cafe");
        let err = svc
            .provision_cafe(&code.code, "Mesa Uno", "Ana", "123456")
            .await
            .unwrap_err();
        // The caller sees what broke the seeding, not the rollback
        assert!(matches!(err, ClientError::Store(ref msg) if msg.contains("insert_table")));
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let svc = service();
        let code = svc.issue_creation_code().await.unwrap();
        svc.provision_cafe(&code.code, "Mesa Uno", "Ana", "123456")
            .await
            .unwrap();

        let outcome = svc
            .provision_cafe(&code.code, "Mesa Dos", "Bo", "654321")
            .await
            .unwrap();
        let ProvisionOutcome::Rejected(result) = outcome else {
            panic!("expected reuse to be rejected");
        };
        assert_eq!(result.code.as_deref(), Some("CODE_USED"));
    }

    #[tokio::test]
    async fn test_expired_and_unknown_codes_rejected() {
        let svc = service();
        let mut stale = CreationCode::issue();
        stale.created_at = Utc::now() - Duration::minutes(CODE_VALIDITY_MINUTES + 1);
        let stale = svc.gateway.insert_creation_code(stale).await.unwrap();

        let outcome = svc
            .provision_cafe(&stale.code, "Mesa Uno", "Ana", "123456")
            .await
            .unwrap();
        let ProvisionOutcome::Rejected(result) = outcome else {
            panic!("expected expiry rejection");
        };
        assert_eq!(result.code.as_deref(), Some("CODE_EXPIRED"));

        let outcome = svc
            .provision_cafe("nope", "Mesa Uno", "Ana", "123456")
            .await
            .unwrap();
        let ProvisionOutcome::Rejected(result) = outcome else {
            panic!("expected unknown-code rejection");
        };
        assert_eq!(result.code.as_deref(), Some("INVALID_CODE"));
    }

    #[tokio::test]
    async fn test_feedback_validation_is_inline() {
        let svc = service();
        let result = svc
            .submit_feedback(FeedbackCreate {
                content: "  ".into(),
                rating: None,
                cafe_id: None,
                staff_id: None,
            })
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.code.as_deref(), Some("EMPTY_CONTENT"));

        let result = svc
            .submit_feedback(FeedbackCreate {
                content: "Great cortado".into(),
                rating: Some(6),
                cafe_id: None,
                staff_id: None,
            })
            .await
            .unwrap();
        assert_eq!(result.code.as_deref(), Some("INVALID_RATING"));

        let result = svc
            .submit_feedback(FeedbackCreate {
                content: "Great cortado".into(),
                rating: Some(5),
                cafe_id: Some("c1".into()),
                staff_id: None,
            })
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_change_pin_flows() {
        let svc = service();
        {
            let mut guard = svc.collections.write().await;
            guard.cafe_id = Some("c1".into());
            for (id, pin) in [("s1", "111111"), ("s2", "222222")] {
                guard.staff.push(Staff {
                    id: id.into(),
                    cafe_id: "c1".into(),
                    name: id.into(),
                    role: StaffRole::Waiter,
                    pin: pin.into(),
                    phone: None,
                });
            }
            let snapshot = guard.staff.clone();
            drop(guard);
            // Mirror the seeded staff into the remote store
            for s in snapshot {
                svc.gateway.insert_staff(s).await.unwrap();
            }
        }

        let result = svc.change_pin("s1", "000000", "333333").await.unwrap();
        assert_eq!(result.code.as_deref(), Some("WRONG_PIN"));

        let result = svc.change_pin("s1", "111111", "222222").await.unwrap();
        assert_eq!(result.code.as_deref(), Some("PIN_TAKEN"));

        let result = svc.change_pin("s1", "111111", "12ab56").await.unwrap();
        assert_eq!(result.code.as_deref(), Some("INVALID_PIN"));

        let result = svc.change_pin("s1", "111111", "333333").await.unwrap();
        assert!(result.success);
        let guard = svc.collections.read().await;
        assert_eq!(
            guard.staff.iter().find(|s| s.id == "s1").unwrap().pin,
            "333333"
        );
    }
}
