//! ContainerSpec から Docker API パラメータへの変換

use crate::runtime::ContainerSpec;
use bollard::models::{
    ContainerCreateBody, HostConfig, Port, PortBinding, RestartPolicy, RestartPolicyNameEnum,
};
use std::collections::HashMap;

/// TCPポートのキー（`5432/tcp`）
pub fn tcp_port_key(port: u16) -> String {
    format!("{}/tcp", port)
}

/// イメージ参照を `(from_image, tag)` に分ける
///
/// タグがなければ `latest`。レジストリのポート番号（`localhost:5000/app`）はタグとみなさない。
/// ダイジェスト指定（`app@sha256:...`）はそのまま渡し、タグは空にする。
pub fn split_image_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }

    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') && !name.is_empty() => (name, tag),
        _ => (image, "latest"),
    }
}

/// 公開ポートを `host:container` 形式で列挙する
///
/// Docker は IPv4 と IPv6 で同じ公開ポートを二度返すので重複を除く。
pub fn published_ports(ports: &[Port]) -> Vec<String> {
    let mut published: Vec<String> = Vec::new();
    for port in ports {
        let Some(public) = port.public_port else {
            continue;
        };
        let entry = format!("{}:{}", public, port.private_port);
        if !published.contains(&entry) {
            published.push(entry);
        }
    }
    published
}

/// ContainerSpec を Docker のコンテナ作成ボディに変換
pub fn to_create_body(spec: &ContainerSpec) -> ContainerCreateBody {
    // ポートは指定がある場合のみ公開（ホストとコンテナで同じ番号）
    let (exposed_ports, port_bindings) = match spec.port {
        Some(port) => {
            let key = tcp_port_key(port);
            let mut exposed_ports = HashMap::new();
            exposed_ports.insert(key.clone(), HashMap::new());

            let mut port_bindings = HashMap::new();
            port_bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(port.to_string()),
                }]),
            );
            (Some(exposed_ports), Some(port_bindings))
        }
        None => (None, None),
    };

    // 再起動はランタイム任せにしない
    let host_config = Some(HostConfig {
        port_bindings,
        binds: (!spec.binds.is_empty()).then(|| spec.binds.clone()),
        restart_policy: Some(RestartPolicy {
            name: Some(RestartPolicyNameEnum::NO),
            maximum_retry_count: None,
        }),
        ..Default::default()
    });

    let labels: HashMap<String, String> = spec
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    ContainerCreateBody {
        image: Some(spec.image.clone()),
        env: Some(spec.env.clone()),
        exposed_ports,
        host_config,
        labels: (!labels.is_empty()).then_some(labels),
        cmd: spec.cmd.clone(),
        working_dir: spec.working_dir.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn postgres_spec() -> ContainerSpec {
        ContainerSpec {
            name: "tempusstack_db".to_string(),
            image: "postgres:15".to_string(),
            env: vec!["POSTGRES_PASSWORD=x".to_string()],
            port: Some(5432),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_create_body_basic() {
        let body = to_create_body(&postgres_spec());

        assert_eq!(body.image, Some("postgres:15".to_string()));
        assert_eq!(body.env, Some(vec!["POSTGRES_PASSWORD=x".to_string()]));
        assert!(body.cmd.is_none());
        assert!(body.labels.is_none());
    }

    #[test]
    fn test_port_published_on_same_number() {
        let body = to_create_body(&postgres_spec());

        let exposed = body.exposed_ports.unwrap();
        assert!(exposed.contains_key("5432/tcp"));

        let bindings = body.host_config.unwrap().port_bindings.unwrap();
        let binding = bindings.get("5432/tcp").unwrap().as_ref().unwrap();
        assert_eq!(binding.len(), 1);
        assert_eq!(binding[0].host_port, Some("5432".to_string()));
    }

    #[test]
    fn test_no_port_means_nothing_published() {
        let spec = ContainerSpec {
            port: None,
            ..postgres_spec()
        };
        let body = to_create_body(&spec);

        assert!(body.exposed_ports.is_none());
        assert!(body.host_config.unwrap().port_bindings.is_none());
    }

    #[test]
    fn test_restart_policy_is_no() {
        let body = to_create_body(&postgres_spec());
        let policy = body.host_config.unwrap().restart_policy.unwrap();
        assert_eq!(policy.name, Some(RestartPolicyNameEnum::NO));
    }

    #[test]
    fn test_binds_cmd_and_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("tempusstack.service".to_string(), "api".to_string());

        let spec = ContainerSpec {
            name: "tempusstack_api".to_string(),
            image: "node:18-alpine".to_string(),
            port: Some(3001),
            cmd: Some(vec!["node".to_string(), "-e".to_string(), "1".to_string()]),
            working_dir: Some("/data".to_string()),
            binds: vec!["/tmp/r.json:/data/responses.json:ro".to_string()],
            labels,
            ..Default::default()
        };
        let body = to_create_body(&spec);

        assert_eq!(body.working_dir, Some("/data".to_string()));
        assert_eq!(body.cmd.as_ref().map(|c| c.len()), Some(3));
        assert_eq!(
            body.labels.unwrap().get("tempusstack.service"),
            Some(&"api".to_string())
        );
        assert_eq!(
            body.host_config.unwrap().binds,
            Some(vec!["/tmp/r.json:/data/responses.json:ro".to_string()])
        );
    }

    #[test]
    fn test_split_image_reference() {
        assert_eq!(split_image_reference("postgres:15"), ("postgres", "15"));
        assert_eq!(split_image_reference("redis"), ("redis", "latest"));
        assert_eq!(
            split_image_reference("localhost:5000/app"),
            ("localhost:5000/app", "latest")
        );
        assert_eq!(
            split_image_reference("localhost:5000/app:v2"),
            ("localhost:5000/app", "v2")
        );
    }

    #[test]
    fn test_split_image_reference_with_digest() {
        let digest = "app@sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        assert_eq!(split_image_reference(digest), (digest, ""));

        let tagged = "registry.local:5000/app:v1@sha256:abc";
        assert_eq!(split_image_reference(tagged), (tagged, ""));
    }

    #[test]
    fn test_published_ports_dedups_ipv4_and_ipv6() {
        let ports = vec![
            Port {
                ip: Some("0.0.0.0".to_string()),
                private_port: 5432,
                public_port: Some(5432),
                ..Default::default()
            },
            Port {
                ip: Some("::".to_string()),
                private_port: 5432,
                public_port: Some(5432),
                ..Default::default()
            },
            Port {
                private_port: 9000,
                public_port: None,
                ..Default::default()
            },
        ];

        assert_eq!(published_ports(&ports), vec!["5432:5432".to_string()]);
    }
}
