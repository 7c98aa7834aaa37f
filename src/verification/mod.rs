//! Document-verification engine: evaluates a user's submissions against the
//! required-document catalog for their role and maintains the aggregate
//! `verification_status` on the user record. That field is a materialized
//! view; nothing outside this module writes it.

use std::collections::HashMap;

use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;

use crate::db::DbConn;
use crate::models::{
    Document, DocumentConfig, DocumentStatus, ProfileType, User, VerificationStatus,
};
use crate::utils::ApiError;

/// The fallback requirement catalog. This is the only place the default
/// tables exist: both roles must prove the parent's and the child's
/// identity, drivers additionally their licence. Admins are not subject to
/// the document flow at all.
pub fn default_requirements_for(profile: &ProfileType) -> Vec<DocumentConfig> {
    if *profile == ProfileType::Admin {
        return Vec::new();
    }

    let mut defaults = vec![
        DocumentConfig {
            id: None,
            document_type: "parent_id".to_string(),
            label: "Parent ID document".to_string(),
            description: Some("Government-issued photo ID of the parent".to_string()),
            profile_type: profile.clone(),
            active: true,
            order: 0,
        },
        DocumentConfig {
            id: None,
            document_type: "child_id".to_string(),
            label: "Child document".to_string(),
            description: Some("Birth certificate or school ID of the child".to_string()),
            profile_type: profile.clone(),
            active: true,
            order: 1,
        },
    ];

    if *profile == ProfileType::Driver {
        defaults.push(DocumentConfig {
            id: None,
            document_type: "driver_license".to_string(),
            label: "Driver licence".to_string(),
            description: Some("Valid driver licence".to_string()),
            profile_type: profile.clone(),
            active: true,
            order: 2,
        });
    }

    defaults
}

/// Active catalog for a role in display order, falling back to the defaults
/// when nothing is configured. Shared by the state machine and the
/// user-facing catalog endpoint.
pub async fn active_requirements(
    db: &DbConn,
    profile: &ProfileType,
) -> Result<Vec<DocumentConfig>, mongodb::error::Error> {
    let find_options = FindOptions::builder().sort(doc! { "order": 1 }).build();

    let mut cursor = db
        .collection::<DocumentConfig>("document_configs")
        .find(
            doc! { "profile_type": profile.as_str(), "active": true },
            find_options,
        )
        .await?;

    let mut configs = Vec::new();
    while cursor.advance().await? {
        configs.push(cursor.deserialize_current()?);
    }

    if configs.is_empty() {
        return Ok(default_requirements_for(profile));
    }

    Ok(configs)
}

/// Collapses a user's submission history into one status per document type.
/// The submission with the greatest `reviewed_at` wins its type; unreviewed
/// submissions count as pending and lose to any reviewed one. The submission
/// currently being reviewed takes the status just assigned to it, since its
/// own record is only updated later in the same transaction.
pub fn effective_statuses(
    submissions: &[Document],
    just_reviewed: Option<(ObjectId, DocumentStatus)>,
) -> HashMap<String, DocumentStatus> {
    let mut best: HashMap<String, (Option<DateTime>, DocumentStatus)> = HashMap::new();

    for submission in submissions {
        let (reviewed_at, status) = match just_reviewed {
            Some((id, new_status)) if submission.id == Some(id) => (Some(DateTime::MAX), new_status),
            _ => (submission.reviewed_at, submission.status),
        };

        match best.get(&submission.document_type) {
            Some((existing, _)) if *existing >= reviewed_at => {}
            _ => {
                best.insert(submission.document_type.clone(), (reviewed_at, status));
            }
        }
    }

    best.into_iter()
        .map(|(document_type, (_, status))| (document_type, status))
        .collect()
}

/// Reduces the per-type effective statuses into the aggregate. Rejection is
/// absolute: the first rejected required type wins, in requirement order.
/// A type with no submission counts as missing and holds the aggregate at
/// pending, as does an empty requirement set (nothing to check is not proof
/// of anything).
pub fn aggregate_status(
    required: &[DocumentConfig],
    effective: &HashMap<String, DocumentStatus>,
) -> VerificationStatus {
    if required.is_empty() {
        return VerificationStatus::Pending;
    }

    let mut all_approved = true;
    for requirement in required {
        match effective.get(&requirement.document_type) {
            Some(DocumentStatus::Rejected) => return VerificationStatus::Rejected,
            Some(DocumentStatus::Approved) => {}
            Some(DocumentStatus::Pending) | None => all_approved = false,
        }
    }

    if all_approved {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Pending
    }
}

/// Applies an admin decision to one document and recomputes the owner's
/// aggregate status. The document write and the aggregate write happen in
/// one transaction so no reader sees one without the other.
pub async fn apply_review(
    db: &DbConn,
    admin_id: ObjectId,
    document_id: ObjectId,
    status: DocumentStatus,
    note: Option<String>,
) -> Result<VerificationStatus, ApiError> {
    if status == DocumentStatus::Rejected && note.as_deref().map_or(true, str::is_empty) {
        return Err(ApiError::bad_request("A reviewer note is required when rejecting"));
    }

    let document = db
        .collection::<Document>("documents")
        .find_one(doc! { "_id": document_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Document not found"))?;

    let user = db
        .collection::<User>("users")
        .find_one(doc! { "_id": document.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.profile_type == ProfileType::Admin {
        return Err(ApiError::bad_request(
            "Administrators are not subject to document verification",
        ));
    }

    let required = active_requirements(db, &user.profile_type)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut cursor = db
        .collection::<Document>("documents")
        .find(doc! { "user_id": document.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut submissions = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let submission = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        submissions.push(submission);
    }

    let effective = effective_statuses(&submissions, Some((document_id, status)));
    let overall = aggregate_status(&required, &effective);

    let mut document_update = doc! {
        "status": status.as_str(),
        "reviewed_by": admin_id,
        "reviewed_at": DateTime::now(),
        "updated_at": DateTime::now(),
    };
    if let Some(ref note) = note {
        document_update.insert("reviewer_note", note);
    }

    let mut session = db
        .client()
        .start_session(None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session error: {}", e)))?;
    session
        .start_transaction(None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Transaction error: {}", e)))?;

    db.collection::<Document>("documents")
        .update_one_with_session(
            doc! { "_id": document_id },
            doc! { "$set": document_update },
            None,
            &mut session,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update document: {}", e)))?;

    db.collection::<User>("users")
        .update_one_with_session(
            doc! { "_id": document.user_id },
            doc! { "$set": {
                "verification_status": overall.as_str(),
                "updated_at": DateTime::now(),
            }},
            None,
            &mut session,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update user status: {}", e)))?;

    session
        .commit_transaction()
        .await
        .map_err(|e| ApiError::internal_error(format!("Commit error: {}", e)))?;

    Ok(overall)
}

/// A fresh submission always reopens review: a rejected account goes back to
/// pending, never straight to verified. Any other status is left alone until
/// the next review decision.
pub fn status_after_submission(current: VerificationStatus) -> VerificationStatus {
    match current {
        VerificationStatus::Rejected => VerificationStatus::Pending,
        other => other,
    }
}

pub async fn reopen_if_rejected(db: &DbConn, user: &User) -> Result<(), mongodb::error::Error> {
    if status_after_submission(user.verification_status) == user.verification_status {
        return Ok(());
    }

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": user.id },
            doc! { "$set": {
                "verification_status": VerificationStatus::Pending.as_str(),
                "updated_at": DateTime::now(),
            }},
            None,
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(
        document_type: &str,
        status: DocumentStatus,
        reviewed_at: Option<DateTime>,
    ) -> Document {
        Document {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            document_type: document_type.to_string(),
            file_url: "/uploads/documents/test.pdf".to_string(),
            document_number: None,
            expires_at: None,
            status,
            reviewer_note: None,
            reviewed_by: None,
            reviewed_at,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    fn statuses(pairs: &[(&str, DocumentStatus)]) -> HashMap<String, DocumentStatus> {
        pairs
            .iter()
            .map(|(t, s)| (t.to_string(), *s))
            .collect()
    }

    #[test]
    fn test_defaults_per_role() {
        let passenger = default_requirements_for(&ProfileType::Passenger);
        let types: Vec<_> = passenger.iter().map(|c| c.document_type.as_str()).collect();
        assert_eq!(types, vec!["parent_id", "child_id"]);

        let driver = default_requirements_for(&ProfileType::Driver);
        let types: Vec<_> = driver.iter().map(|c| c.document_type.as_str()).collect();
        assert_eq!(types, vec!["parent_id", "child_id", "driver_license"]);

        assert!(default_requirements_for(&ProfileType::Admin).is_empty());
    }

    #[test]
    fn test_rejection_is_absolute() {
        let required = default_requirements_for(&ProfileType::Passenger);
        let effective = statuses(&[
            ("parent_id", DocumentStatus::Approved),
            ("child_id", DocumentStatus::Rejected),
        ]);
        assert_eq!(
            aggregate_status(&required, &effective),
            VerificationStatus::Rejected
        );
    }

    #[test]
    fn test_all_approved_is_verified() {
        let required = default_requirements_for(&ProfileType::Passenger);
        let effective = statuses(&[
            ("parent_id", DocumentStatus::Approved),
            ("child_id", DocumentStatus::Approved),
        ]);
        assert_eq!(
            aggregate_status(&required, &effective),
            VerificationStatus::Verified
        );
    }

    #[test]
    fn test_missing_required_type_is_pending() {
        let required = default_requirements_for(&ProfileType::Passenger);
        let effective = statuses(&[("parent_id", DocumentStatus::Approved)]);
        assert_eq!(
            aggregate_status(&required, &effective),
            VerificationStatus::Pending
        );
    }

    #[test]
    fn test_pending_required_type_is_pending() {
        let required = default_requirements_for(&ProfileType::Passenger);
        let effective = statuses(&[
            ("parent_id", DocumentStatus::Approved),
            ("child_id", DocumentStatus::Pending),
        ]);
        assert_eq!(
            aggregate_status(&required, &effective),
            VerificationStatus::Pending
        );
    }

    #[test]
    fn test_driver_needs_the_licence_too() {
        let required = default_requirements_for(&ProfileType::Driver);
        let effective = statuses(&[
            ("parent_id", DocumentStatus::Approved),
            ("child_id", DocumentStatus::Approved),
        ]);
        assert_eq!(
            aggregate_status(&required, &effective),
            VerificationStatus::Pending
        );
    }

    #[test]
    fn test_empty_requirement_set_is_pending() {
        let effective = statuses(&[("parent_id", DocumentStatus::Approved)]);
        assert_eq!(aggregate_status(&[], &effective), VerificationStatus::Pending);
    }

    #[test]
    fn test_latest_reviewed_submission_wins_its_type() {
        let older = submission(
            "parent_id",
            DocumentStatus::Rejected,
            Some(DateTime::from_millis(1_000)),
        );
        let newer = submission(
            "parent_id",
            DocumentStatus::Approved,
            Some(DateTime::from_millis(2_000)),
        );

        let effective = effective_statuses(&[older, newer], None);
        assert_eq!(effective.get("parent_id"), Some(&DocumentStatus::Approved));
    }

    #[test]
    fn test_unreviewed_submission_loses_to_reviewed_one() {
        let reviewed = submission(
            "parent_id",
            DocumentStatus::Approved,
            Some(DateTime::from_millis(1_000)),
        );
        let unreviewed = submission("parent_id", DocumentStatus::Pending, None);

        let effective = effective_statuses(&[unreviewed, reviewed], None);
        assert_eq!(effective.get("parent_id"), Some(&DocumentStatus::Approved));
    }

    #[test]
    fn test_just_reviewed_submission_overrides_history() {
        let old_approval = submission(
            "parent_id",
            DocumentStatus::Approved,
            Some(DateTime::from_millis(2_000)),
        );
        let under_review = submission("parent_id", DocumentStatus::Pending, None);
        let under_review_id = under_review.id.unwrap();

        let effective = effective_statuses(
            &[old_approval, under_review],
            Some((under_review_id, DocumentStatus::Rejected)),
        );
        assert_eq!(effective.get("parent_id"), Some(&DocumentStatus::Rejected));
    }

    #[test]
    fn test_resubmission_reopens_rejected_account() {
        assert_eq!(
            status_after_submission(VerificationStatus::Rejected),
            VerificationStatus::Pending
        );
        // Never straight back to verified, and no change for the others.
        assert_eq!(
            status_after_submission(VerificationStatus::Pending),
            VerificationStatus::Pending
        );
        assert_eq!(
            status_after_submission(VerificationStatus::Verified),
            VerificationStatus::Verified
        );
    }

    #[test]
    fn test_full_review_cycle_rejects_then_verifies() {
        let required = default_requirements_for(&ProfileType::Passenger);

        let parent = submission("parent_id", DocumentStatus::Approved, Some(DateTime::from_millis(1_000)));
        let child = submission("child_id", DocumentStatus::Pending, None);
        let child_id = child.id.unwrap();
        let submissions = vec![parent, child];

        let rejected = effective_statuses(&submissions, Some((child_id, DocumentStatus::Rejected)));
        assert_eq!(
            aggregate_status(&required, &rejected),
            VerificationStatus::Rejected
        );

        let approved = effective_statuses(&submissions, Some((child_id, DocumentStatus::Approved)));
        assert_eq!(
            aggregate_status(&required, &approved),
            VerificationStatus::Verified
        );
    }
}
