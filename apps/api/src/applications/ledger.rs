//! Application ledger: submitting applications with a resume, listing them
//! from both sides, and moving them through review.

use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{
    Application, ApplicationDetail, ApplicationStatus, NewApplication, ReceivedApplication,
    SubmittedApplication,
};
use crate::models::job::{JobBrief, JobSummary};
use crate::models::user::{ApplicantProfile, ApplicantSummary};
use crate::policy::{authorize, Action, Identity, Resource};
use crate::resumes::{ResumeStorage, ResumeUpload};
use crate::store::{Store, StoreError, UniqueKey};

/// Parsed multipart form of `POST /api/applications`.
#[derive(Debug, Default)]
pub struct ApplyForm {
    pub job_id: Option<String>,
    pub cover_letter: Option<String>,
    pub resume: Option<ResumeUpload>,
}

/// Where uploaded resumes go and how large they may be.
pub struct ResumeIntake<'a> {
    pub storage: &'a dyn ResumeStorage,
    pub max_bytes: usize,
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{what} not found"))
}

async fn detail(store: &dyn Store, application: Application) -> Result<ApplicationDetail, AppError> {
    let job = store
        .job_by_id(application.job_id)
        .await?
        .map(|j| JobBrief::from(&j));
    let applicant = store
        .user_by_id(application.applicant_id)
        .await?
        .map(|u| ApplicantSummary::from(&u));
    Ok(ApplicationDetail {
        application,
        job,
        applicant,
    })
}

/// Submits an application for the caller. The file is written only once the
/// request is otherwise valid, and removed again if the insert loses a race
/// with a concurrent duplicate.
pub async fn apply(
    store: &dyn Store,
    intake: ResumeIntake<'_>,
    identity: &Identity,
    form: ApplyForm,
) -> Result<ApplicationDetail, AppError> {
    authorize(identity, Action::Apply, Resource::Unresolved)?;

    let resume = form.resume.ok_or(AppError::MissingResume)?;
    resume.validate(intake.max_bytes)?;

    let raw_job_id = form
        .job_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("jobId is required".to_string()))?;
    let job_id: Uuid = raw_job_id.parse().map_err(|_| not_found("Job"))?;
    store.job_by_id(job_id).await?.ok_or_else(|| not_found("Job"))?;

    if store.application_exists(job_id, identity.id).await? {
        return Err(AppError::DuplicateApplication);
    }

    let reference = intake.storage.store(&resume).await?;
    let cover_letter = form
        .cover_letter
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let inserted = store
        .insert_application(NewApplication {
            job_id,
            applicant_id: identity.id,
            resume: reference.clone(),
            cover_letter,
        })
        .await;

    let application = match inserted {
        Ok(application) => application,
        Err(err) => {
            if let Err(cleanup) = intake.storage.remove(&reference).await {
                warn!("Failed to remove orphaned resume {reference}: {cleanup}");
            }
            return Err(match err {
                StoreError::Conflict(UniqueKey::ApplicationPair) => AppError::DuplicateApplication,
                other => other.into(),
            });
        }
    };

    info!(
        "Application {} submitted by {} for job {}",
        application.id, identity.id, job_id
    );
    detail(store, application).await
}

/// The caller's own applications, optionally filtered by status.
pub async fn list_mine(
    store: &dyn Store,
    identity: &Identity,
    status: Option<&str>,
) -> Result<Vec<SubmittedApplication>, AppError> {
    authorize(identity, Action::ListOwnApplications, Resource::Unresolved)?;
    let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<ApplicationStatus>().map_err(AppError::Validation)?),
        None => None,
    };

    let applications = store.applications_by_applicant(identity.id, status).await?;
    let mut job_ids: Vec<Uuid> = applications.iter().map(|a| a.job_id).collect();
    job_ids.sort_unstable();
    job_ids.dedup();
    let jobs: HashMap<Uuid, JobSummary> = store
        .jobs_by_ids(&job_ids)
        .await?
        .iter()
        .map(|j| (j.id, JobSummary::from(j)))
        .collect();

    Ok(applications
        .into_iter()
        .map(|application| SubmittedApplication {
            job: jobs.get(&application.job_id).cloned(),
            application,
        })
        .collect())
}

/// Applications received for one job. Owner or admin only.
pub async fn list_for_job(
    store: &dyn Store,
    identity: &Identity,
    job_id: Uuid,
) -> Result<Vec<ReceivedApplication>, AppError> {
    authorize(identity, Action::ViewJobApplications, Resource::Unresolved)?;
    let job = store.job_by_id(job_id).await?.ok_or_else(|| not_found("Job"))?;
    authorize(
        identity,
        Action::ViewJobApplications,
        Resource::OwnedBy(job.employer_id),
    )?;

    let applications = store.applications_for_job(job_id).await?;
    let mut applicant_ids: Vec<Uuid> = applications.iter().map(|a| a.applicant_id).collect();
    applicant_ids.sort_unstable();
    applicant_ids.dedup();
    let applicants: HashMap<Uuid, ApplicantProfile> = store
        .users_by_ids(&applicant_ids)
        .await?
        .iter()
        .map(|u| (u.id, ApplicantProfile::from(u)))
        .collect();

    Ok(applications
        .into_iter()
        .map(|application| ReceivedApplication {
            applicant: applicants.get(&application.applicant_id).cloned(),
            application,
        })
        .collect())
}

/// Moves an application to `status`. The job's owner or an admin may do
/// this; once the job is gone only an admin can.
pub async fn set_status(
    store: &dyn Store,
    identity: &Identity,
    id: Uuid,
    status: Option<&str>,
) -> Result<ApplicationDetail, AppError> {
    authorize(identity, Action::SetApplicationStatus, Resource::Unresolved)?;
    let status: ApplicationStatus = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Status is required".to_string()))?
        .parse()
        .map_err(AppError::Validation)?;

    let application = store
        .application_by_id(id)
        .await?
        .ok_or_else(|| not_found("Application"))?;
    let resource = match store.job_by_id(application.job_id).await? {
        Some(job) => Resource::OwnedBy(job.employer_id),
        None => Resource::Orphaned,
    };
    authorize(identity, Action::SetApplicationStatus, resource)?;

    let updated = store
        .set_application_status(id, status)
        .await?
        .ok_or_else(|| not_found("Application"))?;
    info!("Application {} set to {:?} by {}", id, status, identity.id);
    detail(store, updated).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{JobFields, JobStatus, JobType, NewJob};
    use crate::models::user::{NewUser, Role, User};
    use crate::resumes::LocalResumeStorage;
    use crate::store::MemoryStore;
    use bytes::Bytes;

    struct Fixture {
        store: MemoryStore,
        storage: LocalResumeStorage,
        dir: tempfile::TempDir,
        employer: Identity,
        seeker: Identity,
        job_id: Uuid,
    }

    async fn user(store: &MemoryStore, name: &str, role: Role) -> User {
        store
            .insert_user(NewUser {
                name: name.into(),
                email: format!("{name}@example.com"),
                password_hash: "x".into(),
                role,
                company_name: None,
            })
            .await
            .unwrap()
    }

    fn as_identity(u: &User) -> Identity {
        Identity {
            id: u.id,
            role: u.role,
        }
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalResumeStorage::new(dir.path()).await.unwrap();
        let employer = user(&store, "acme", Role::Employer).await;
        let seeker = user(&store, "jane", Role::JobSeeker).await;
        let job = store
            .insert_job(NewJob {
                employer_id: employer.id,
                fields: JobFields {
                    title: "Backend Engineer".into(),
                    description: "Build APIs".into(),
                    company: "Acme".into(),
                    category: "Technology".into(),
                    location: "Remote".into(),
                    salary: None,
                    job_type: JobType::FullTime,
                    requirements: vec![],
                    status: JobStatus::Active,
                },
            })
            .await
            .unwrap();
        Fixture {
            employer: as_identity(&employer),
            seeker: as_identity(&seeker),
            job_id: job.id,
            store,
            storage,
            dir,
        }
    }

    impl Fixture {
        fn intake(&self) -> ResumeIntake<'_> {
            ResumeIntake {
                storage: &self.storage,
                max_bytes: 1024,
            }
        }

        fn stored_files(&self) -> usize {
            std::fs::read_dir(self.dir.path().join("resumes"))
                .unwrap()
                .count()
        }
    }

    fn form(job_id: Option<String>) -> ApplyForm {
        ApplyForm {
            job_id,
            cover_letter: Some("  I'd love to join.  ".into()),
            resume: Some(ResumeUpload {
                file_name: "cv.pdf".into(),
                content_type: Some("application/pdf".into()),
                bytes: Bytes::from_static(b"%PDF-1.4"),
            }),
        }
    }

    #[tokio::test]
    async fn test_apply_embeds_job_and_applicant() {
        let f = fixture().await;
        let detail = apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string())))
            .await
            .unwrap();
        assert_eq!(detail.application.status, ApplicationStatus::Pending);
        assert_eq!(detail.application.cover_letter.as_deref(), Some("I'd love to join."));
        assert!(detail.application.resume.starts_with("uploads/resumes/"));
        assert_eq!(detail.job.unwrap().title, "Backend Engineer");
        assert_eq!(detail.applicant.unwrap().name, "jane");
        assert_eq!(f.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_apply_without_resume() {
        let f = fixture().await;
        let mut no_file = form(Some(f.job_id.to_string()));
        no_file.resume = None;
        let err = apply(&f.store, f.intake(), &f.seeker, no_file)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingResume));
        assert_eq!(f.stored_files(), 0);
    }

    #[tokio::test]
    async fn test_apply_to_unknown_or_missing_job() {
        let f = fixture().await;
        let err = apply(&f.store, f.intake(), &f.seeker, form(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        for bad in ["nope".to_string(), Uuid::new_v4().to_string()] {
            let err = apply(&f.store, f.intake(), &f.seeker, form(Some(bad)))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
        assert_eq!(f.stored_files(), 0);
    }

    #[tokio::test]
    async fn test_second_application_rejected() {
        let f = fixture().await;
        apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string())))
            .await
            .unwrap();
        let err = apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateApplication));
        assert_eq!(f.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_leave_one_application() {
        let f = fixture().await;
        let (a, b) = tokio::join!(
            apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string()))),
            apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string()))),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert!(matches!(
            a.err().or(b.err()),
            Some(AppError::DuplicateApplication)
        ));
        assert_eq!(f.store.applications_for_job(f.job_id).await.unwrap().len(), 1);
        assert_eq!(f.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_list_mine_filters_by_status() {
        let f = fixture().await;
        let detail = apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string())))
            .await
            .unwrap();

        let all = list_mine(&f.store, &f.seeker, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].job.as_ref().unwrap().company, "Acme");

        assert!(list_mine(&f.store, &f.seeker, Some("accepted"))
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            list_mine(&f.store, &f.seeker, Some("lost")).await,
            Err(AppError::Validation(_))
        ));

        set_status(&f.store, &f.employer, detail.application.id, Some("accepted"))
            .await
            .unwrap();
        assert_eq!(
            list_mine(&f.store, &f.seeker, Some("accepted"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_list_for_job_requires_ownership() {
        let f = fixture().await;
        apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string())))
            .await
            .unwrap();

        let received = list_for_job(&f.store, &f.employer, f.job_id).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].applicant.as_ref().unwrap().email,
            "jane@example.com"
        );

        let rival = as_identity(&user(&f.store, "rival", Role::Employer).await);
        assert!(matches!(
            list_for_job(&f.store, &rival, f.job_id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            list_for_job(&f.store, &f.seeker, f.job_id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_set_status_rules() {
        let f = fixture().await;
        let id = apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string())))
            .await
            .unwrap()
            .application
            .id;

        assert!(matches!(
            set_status(&f.store, &f.employer, id, Some("hired")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            set_status(&f.store, &f.employer, id, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            set_status(&f.store, &f.seeker, id, Some("accepted")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            set_status(&f.store, &f.employer, Uuid::new_v4(), Some("accepted")).await,
            Err(AppError::NotFound(_))
        ));

        let reviewed = set_status(&f.store, &f.employer, id, Some("reviewed"))
            .await
            .unwrap();
        assert_eq!(reviewed.application.status, ApplicationStatus::Reviewed);
        let back = set_status(&f.store, &f.employer, id, Some("pending"))
            .await
            .unwrap();
        assert_eq!(back.application.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_deleted_job_orphans_application() {
        let f = fixture().await;
        let id = apply(&f.store, f.intake(), &f.seeker, form(Some(f.job_id.to_string())))
            .await
            .unwrap()
            .application
            .id;
        assert!(f.store.delete_job(f.job_id).await.unwrap());

        let mine = list_mine(&f.store, &f.seeker, None).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine[0].job.is_none());

        assert!(matches!(
            set_status(&f.store, &f.employer, id, Some("rejected")).await,
            Err(AppError::Forbidden(_))
        ));
        let admin = as_identity(&user(&f.store, "root", Role::Admin).await);
        let detail = set_status(&f.store, &admin, id, Some("rejected"))
            .await
            .unwrap();
        assert!(detail.job.is_none());
        assert_eq!(detail.application.status, ApplicationStatus::Rejected);
    }
}
