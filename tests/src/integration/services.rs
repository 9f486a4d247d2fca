//! # Domain Clients End to End
//!
//! `Services` over the real engine and broker, answered by a fake owner.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{Directory, Harness};
    use gateway_services::{Role, ServiceClient, ServiceError, Services, Ticket, User};
    use std::time::Duration;

    fn services(h: &Harness) -> Services {
        Services::new(h.engine.clone())
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let h = Harness::new();
        let _directory = Directory::spawn(&h.broker);
        let services = services(&h);

        let admin = services.users.find_by_id(1).await.unwrap();
        assert_eq!(admin.email.as_deref(), Some("admin@example.com"));

        let missing = services.users.find_by_id(42).await.unwrap_err();
        assert_eq!(missing, ServiceError::NotFound { resource: "user" });

        let all = services.users.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_round_trip() {
        let h = Harness::new();
        let directory = Directory::spawn(&h.broker);
        let services = services(&h);

        let created = services
            .users
            .create(&User {
                email: Some("grace@example.com".into()),
                password: Some("$2b$10$hash".into()),
                first_name: Some("Grace".into()),
                last_name: Some("Hopper".into()),
                roles: Some(vec![1]),
                ..User::default()
            })
            .await
            .unwrap();

        assert_eq!(created.id, Some(2));
        assert_eq!(directory.users.lock().len(), 2);
        let found = services.users.find_by_email("grace@example.com").await.unwrap();
        assert_eq!(found.first_name.as_deref(), Some("Grace"));
    }

    #[tokio::test]
    async fn test_principal_for_login() {
        let h = Harness::new();
        let _directory = Directory::spawn(&h.broker);
        let services = services(&h);

        let principal = services
            .auth
            .principal_for_email("admin@example.com")
            .await
            .unwrap();
        assert_eq!(principal.secret.as_deref(), Some("twoFaSecret"));
        assert!(principal.profile().roles.is_some());

        assert_eq!(
            services.auth.principal_for_email("who@example.com").await,
            Err(ServiceError::Unauthorized("Credentials not correct".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_without_user_service_is_unavailable() {
        let h = Harness::new();
        let services = services(&h);

        let err = services
            .auth
            .principal_for_email("admin@example.com")
            .await
            .unwrap_err();

        assert!(err.is_unavailable(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_roles_and_tickets() {
        let h = Harness::new();
        let directory = Directory::spawn(&h.broker);
        let services = services(&h);

        let role = services.roles.create("support").await.unwrap();
        assert_eq!(
            role,
            Role {
                id: Some(2),
                name: Some("support".into())
            }
        );
        assert_eq!(services.roles.find_all().await.unwrap().len(), 2);

        services
            .tickets
            .create(&Ticket {
                title: Some("VPN down".into()),
                user: Some(1),
                ..Ticket::default()
            })
            .await
            .unwrap();
        let mine = services.tickets.find_by_user_id(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title.as_deref(), Some("VPN down"));
        assert!(services.tickets.find_by_user_id(2).await.unwrap().is_empty());

        assert!(directory.requests_handled() >= 5);
    }

    #[tokio::test]
    async fn test_client_timeout_override() {
        let h = Harness::new();
        let services =
            Services::from_client(ServiceClient::new(h.engine.clone()).with_timeout(Duration::from_millis(30)));

        let started = tokio::time::Instant::now();
        let err = services.tickets.find_all().await.unwrap_err();

        assert!(err.is_unavailable());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
