//! Provision command - runs the install phase against the configured store

use tracing::info;

pub async fn run() -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::init_console_logging(&config);

    let state = crate::create_app_state_with_config(&config).await?;
    state.registration.install_pending().await?;

    let partitions = state.store.list_names().await?;
    info!(partitions = ?partitions, "Provisioning complete");
    println!("Provisioned {}", config.to_policy()?.static_partition());

    Ok(())
}
