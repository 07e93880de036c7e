// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create the nginx deployment in the default namespace.

use super::Session;
use crate::constants::DEFAULT_NAMESPACE;
use crate::error::Result;
use crate::kubernetes::resources::{create_deployment, nginx_deployment};
use kube::ResourceExt;
use tracing::info;

/// Create the deployment and return the name the API server stored it under
pub async fn run(session: &Session) -> Result<String> {
    println!("Connected to external cluster: {}", session.host);

    let deployment = nginx_deployment(DEFAULT_NAMESPACE);
    let created = create_deployment(&session.client, DEFAULT_NAMESPACE, &deployment).await?;
    info!("Created deployment in namespace {}", DEFAULT_NAMESPACE);

    println!("Successfully created deployment: {}", created.name_any());
    Ok(created.name_any())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::session;
    use crate::error::InformerError;
    use crate::test_utils::{make_deployment, MockService};

    const PATH: &str = "/apis/apps/v1/namespaces/default/deployments";

    #[tokio::test]
    async fn test_run_creates_deployment() {
        let deployment = make_deployment("nginx-deployment", "default", 3);
        let created = serde_json::to_string(&deployment).unwrap();
        let client = MockService::new().on_post(PATH, 201, &created).into_client();

        let name = run(&session(client)).await.unwrap();
        assert_eq!(name, "nginx-deployment");
    }

    #[tokio::test]
    async fn test_run_fails_when_api_rejects() {
        let conflict = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "deployments.apps \"nginx-deployment\" already exists",
            "reason": "AlreadyExists",
            "code": 409
        })
        .to_string();
        let client = MockService::new().on_post(PATH, 409, &conflict).into_client();

        let err = run(&session(client)).await.unwrap_err();
        assert!(matches!(err, InformerError::KubeError(_)));
    }
}
