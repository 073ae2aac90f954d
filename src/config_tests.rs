// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::config::OperatorConfig;
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn test_parse_flags() {
        let config = OperatorConfig::try_parse_from([
            "ingress-operator",
            "--namespace",
            "ingress-ops",
            "--operand-namespace",
            "ingress-routers",
            "--ingress-controller-image",
            "quay.io/example/router:latest",
            "--metrics-addr",
            "127.0.0.1:9090",
            "--error-requeue-secs",
            "10",
        ])
        .unwrap();

        assert_eq!(config.namespace, "ingress-ops");
        assert_eq!(config.operand_namespace, "ingress-routers");
        assert_eq!(config.ingress_controller_image, "quay.io/example/router:latest");
        assert_eq!(config.metrics_addr.port(), 9090);
        assert_eq!(config.error_requeue(), Duration::from_secs(10));
    }

    #[test]
    fn test_with_image_uses_defaults() {
        let config = OperatorConfig::with_image("router:test");
        assert_eq!(config.namespace, "openshift-ingress-operator");
        assert_eq!(config.operand_namespace, "openshift-ingress");
        assert_eq!(config.error_requeue(), Duration::from_secs(30));
        assert_eq!(config.metrics_addr.port(), 60000);
    }
}
