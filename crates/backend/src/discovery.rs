//! Pod discovery for a named pod group.

use crate::runner::CommandRunner;
use crate::InvocationError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodAddress {
    pub name: String,
    pub ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(rename = "podIP")]
    pod_ip: Option<String>,
}

/// List the pods of `namespace` matching `selector`, ordered by name.
pub fn discover_pods<R: CommandRunner + ?Sized>(
    runner: &R,
    namespace: &str,
    selector: &str,
) -> Result<Vec<PodAddress>, InvocationError> {
    let args: Vec<String> = ["-n", namespace, "get", "pods", "-l", selector, "-o", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let output = runner.run("kubectl", &args)?;
    if !output.success {
        return Err(InvocationError::Discovery(output.text));
    }
    parse_pod_list(&output.text)
}

pub(crate) fn parse_pod_list(json: &str) -> Result<Vec<PodAddress>, InvocationError> {
    let list: PodList =
        serde_json::from_str(json).map_err(|e| InvocationError::Discovery(e.to_string()))?;
    let mut pods: Vec<PodAddress> = list
        .items
        .into_iter()
        .map(|pod| PodAddress {
            name: pod.metadata.name,
            ip: pod.status.pod_ip,
        })
        .collect();
    pods.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use std::cell::RefCell;

    struct RecordingRunner {
        args: RefCell<Vec<String>>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, _program: &str, args: &[String]) -> Result<CommandOutput, InvocationError> {
            *self.args.borrow_mut() = args.to_vec();
            Ok(CommandOutput {
                code: Some(0),
                success: true,
                text: r#"{"items": [{"metadata": {"name": "kernels-0"}}]}"#.into(),
            })
        }
    }

    #[test]
    fn test_discovery_requests_json_pod_list() {
        let runner = RecordingRunner {
            args: RefCell::new(Vec::new()),
        };
        let pods = discover_pods(&runner, "kernels", "app=kernels").unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(
            *runner.args.borrow(),
            ["-n", "kernels", "get", "pods", "-l", "app=kernels", "-o", "json"]
        );
    }

    #[test]
    fn test_parse_sorts_by_name() {
        let json = r#"{
            "items": [
                {"metadata": {"name": "kernels-b"}, "status": {"podIP": "10.0.0.3"}},
                {"metadata": {"name": "kernels-a"}, "status": {"podIP": "10.0.0.2"}},
                {"metadata": {"name": "kernels-c"}, "status": {}}
            ]
        }"#;
        let pods = parse_pod_list(json).unwrap();
        let names: Vec<&str> = pods.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["kernels-a", "kernels-b", "kernels-c"]);
        assert_eq!(pods[0].ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(pods[2].ip, None);
    }

    #[test]
    fn test_parse_garbage_is_discovery_error() {
        let err = parse_pod_list("error: the server doesn't have a resource type").unwrap_err();
        assert!(matches!(err, InvocationError::Discovery(_)));
    }
}
