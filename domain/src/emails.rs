use crate::{
    error::Error,
    gateway::mailersend::{MailerSendClient, SendEmailRequestBuilder},
    mentorship_requests, profiles,
};

use log::*;
use service::config::Config;

/// Tell a mentor that a student asked them for mentorship.
pub async fn send_mentorship_request_email(
    config: &Config,
    mentor: &profiles::Model,
    student: &profiles::Model,
    request: &mentorship_requests::Model,
) -> Result<(), Error> {
    info!(
        "Initiating mentorship request email to mentor {} for request {}",
        mentor.user_id, request.id
    );

    let template_id = config.mentorship_request_email_template_id().ok_or_else(|| {
        warn!("Mentorship request email template ID not configured");
        Error::config()
    })?;

    let mailersend_client = MailerSendClient::new(config)?;

    let mut builder = SendEmailRequestBuilder::new()
        .from(config.notification_sender_email())
        .to_with_name(&mentor.email, mentor.name.clone())
        .subject("You have a new mentorship request")
        .template_id(template_id)
        .add_personalization("mentor_name", mentor.name.as_str())
        .add_personalization("student_name", student.name.as_str())
        .add_personalization("field_of_interest", request.field_of_interest.as_str());

    if let Some(url) = config.mentorship_request_url(&request.id.to_string()) {
        builder = builder.add_personalization("request_url", url);
    }

    mailersend_client.send_email(builder.build()?).await?;
    Ok(())
}

/// Tell a student that their mentor accepted, declined or completed their request.
pub async fn send_mentorship_status_email(
    config: &Config,
    student: &profiles::Model,
    mentor: &profiles::Model,
    request: &mentorship_requests::Model,
) -> Result<(), Error> {
    info!(
        "Initiating mentorship status email to student {} for request {} ({})",
        student.user_id, request.id, request.status
    );

    let template_id = config.mentorship_status_email_template_id().ok_or_else(|| {
        warn!("Mentorship status email template ID not configured");
        Error::config()
    })?;

    let mailersend_client = MailerSendClient::new(config)?;

    let subject = format!("Your mentorship request was {}", request.status);
    let mut builder = SendEmailRequestBuilder::new()
        .from(config.notification_sender_email())
        .to_with_name(&student.email, student.name.clone())
        .subject(&subject)
        .template_id(template_id)
        .add_personalization("student_name", student.name.as_str())
        .add_personalization("mentor_name", mentor.name.as_str())
        .add_personalization("status", request.status.to_string())
        .add_personalization("field_of_interest", request.field_of_interest.as_str());

    if let Some(url) = config.mentorship_request_url(&request.id.to_string()) {
        builder = builder.add_personalization("request_url", url);
    }

    mailersend_client.send_email(builder.build()?).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use crate::Id;
    use clap::Parser;
    use entity::mentorship_status::MentorshipStatus;
    use entity::roles::Role;
    use mockito::Server;
    use serial_test::serial;

    fn profile(name: &str, email: &str, role: Role) -> profiles::Model {
        let now = chrono::Utc::now().fixed_offset();
        let is_mentor_available = role == Role::Alumni;
        profiles::Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            is_verified: true,
            is_mentor_available,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(student: &profiles::Model, mentor: &profiles::Model) -> mentorship_requests::Model {
        let now = chrono::Utc::now().fixed_offset();
        mentorship_requests::Model {
            id: Id::new_v4(),
            student_id: student.user_id,
            mentor_id: Some(mentor.user_id),
            field_of_interest: "Compilers".to_string(),
            description: None,
            goals: None,
            preferred_time: None,
            status: MentorshipStatus::Accepted,
            chat_closed_reason: None,
            chat_closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn config_for(server_url: &str, extra: &[&str]) -> Config {
        let mut args = vec![
            "mentorship_platform_rs",
            "--mailersend-base-url",
            server_url,
            "--mailersend-api-key",
            "test_api_key_123",
            "--notification-sender-email",
            "notifications@alumni-network.org",
        ];
        args.extend_from_slice(extra);
        Config::parse_from(args)
    }

    #[tokio::test]
    #[serial]
    async fn mentorship_request_email_is_sent_to_the_mentor() -> Result<(), Error> {
        let mut server = Server::new_async().await;
        let mentor = profile("Grace Hopper", "grace@alumni.example.edu", Role::Alumni);
        let student = profile("Ada Lovelace", "ada@student.example.edu", Role::Student);
        let request = request(&student, &mentor);
        let config = config_for(
            &server.url(),
            &["--mentorship-request-email-template-id", "template_123"],
        );

        let mock = server
            .mock("POST", "/email")
            .match_header("authorization", "Bearer test_api_key_123")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "from": { "email": "notifications@alumni-network.org" },
                "to": [{ "email": "grace@alumni.example.edu", "name": "Grace Hopper" }],
                "template_id": "template_123",
                "personalization": [{
                    "email": "grace@alumni.example.edu",
                    "data": {
                        "mentor_name": "Grace Hopper",
                        "student_name": "Ada Lovelace",
                        "field_of_interest": "Compilers"
                    }
                }]
            })))
            .with_status(202)
            .create_async()
            .await;

        send_mentorship_request_email(&config, &mentor, &student, &request).await?;
        mock.assert_async().await;

        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn mentorship_status_email_names_the_new_status() -> Result<(), Error> {
        let mut server = Server::new_async().await;
        let mentor = profile("Grace Hopper", "grace@alumni.example.edu", Role::Alumni);
        let student = profile("Ada Lovelace", "ada@student.example.edu", Role::Student);
        let request = request(&student, &mentor);
        let config = config_for(
            &server.url(),
            &["--mentorship-status-email-template-id", "template_456"],
        );

        let mock = server
            .mock("POST", "/email")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "to": [{ "email": "ada@student.example.edu" }],
                "subject": "Your mentorship request was accepted",
                "personalization": [{ "data": { "status": "accepted" } }]
            })))
            .with_status(202)
            .create_async()
            .await;

        send_mentorship_status_email(&config, &student, &mentor, &request).await?;
        mock.assert_async().await;

        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn missing_template_id_is_a_config_error() {
        let server = Server::new_async().await;
        let mentor = profile("Grace Hopper", "grace@alumni.example.edu", Role::Alumni);
        let student = profile("Ada Lovelace", "ada@student.example.edu", Role::Student);
        let request = request(&student, &mentor);
        let config = config_for(&server.url(), &[]);

        if config.mentorship_request_email_template_id().is_none() {
            let err = send_mentorship_request_email(&config, &mentor, &student, &request)
                .await
                .unwrap_err();
            assert_eq!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::Config)
            );
        }
    }
}
