//! Partitions command - lists partitions and which belong to the configured version

use clap::Args;

use crate::domain::policy::PolicyConfig;
use crate::infrastructure::partition::PartitionStoreFactory;

#[derive(Args, Debug, Default)]
pub struct PartitionsArgs {
    /// Only list partitions that activation would delete
    #[arg(long)]
    pub stale: bool,
}

pub async fn run(args: PartitionsArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::init_console_logging(&config);

    let policy = config.to_policy()?;
    let store = PartitionStoreFactory::new().create(&config.storage).await?;
    let names = store.list_names().await?;

    for line in render(&policy, &names, args.stale) {
        println!("{}", line);
    }

    Ok(())
}

fn render(policy: &PolicyConfig, names: &[String], stale_only: bool) -> Vec<String> {
    names
        .iter()
        .filter_map(|name| {
            let current = policy.is_current_partition(name);

            match (current, stale_only) {
                (true, true) => None,
                (true, false) => Some(format!("{}\tcurrent", name)),
                (false, _) => Some(format!("{}\tstale", name)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn names() -> Vec<String> {
        ["app-static-v1", "app-static-v2", "app-dynamic-v2"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_render_marks_current_version() {
        let policy = PolicyConfig::new(Url::parse("http://app.local").unwrap(), "v2");

        assert_eq!(
            render(&policy, &names(), false),
            vec![
                "app-static-v1\tstale",
                "app-static-v2\tcurrent",
                "app-dynamic-v2\tcurrent"
            ]
        );
    }

    #[test]
    fn test_render_stale_only() {
        let policy = PolicyConfig::new(Url::parse("http://app.local").unwrap(), "v2");

        assert_eq!(render(&policy, &names(), true), vec!["app-static-v1\tstale"]);
    }
}
