use anyhow::Context;
use console_core::observability::init_tracing;
use ekklesia_console::config::get_configuration;
use ekklesia_console::notifications::Section;
use ekklesia_console::session::FileSessionStore;
use ekklesia_console::Console;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration().context("Failed to load configuration")?;
    init_tracing(
        "ekklesia-console",
        &settings.telemetry.log_level,
        settings.telemetry.otlp_endpoint.as_deref(),
    )?;

    let store = Arc::new(FileSessionStore::new(&settings.session.store_path));
    let console = Console::build(&settings, store).await?;

    let mut notices = console.notices().subscribe();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            tracing::info!(level = %notice.level, "{}", notice.message);
        }
    });

    for section in [Section::Dashboard, Section::Donations, Section::Events] {
        console.dispatcher().on_refresh(section, move || {
            tracing::info!(section = %section, "Section refresh requested");
        });
    }

    let user = match console.resume().await? {
        Some(user) => user,
        None => {
            let credentials = settings
                .credentials
                .as_ref()
                .context("No stored session and no credentials configured")?;
            console
                .login(&credentials.email, &credentials.password)
                .await
                .context("Login failed")?
        }
    };

    tracing::info!(
        user_id = user.id,
        role = user.role.as_str(),
        "Signed in as {}",
        user.display_name()
    );

    if user.role.is_admin() {
        match console.donations().list().await {
            Ok(donations) => tracing::info!(count = donations.len(), "Donations loaded"),
            Err(e) => tracing::warn!(error = %e, "Failed to load donations"),
        }
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    console.channel().close();

    Ok(())
}
