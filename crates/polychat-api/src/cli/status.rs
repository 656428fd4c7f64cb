//! Credential and proxy status command.

use anyhow::Result;
use console::style;

use polychat_infra::client::http::HttpProxyClient;
use polychat_infra::secret::Credentials;
use polychat_types::proxy::ProviderStatusMap;
use polychat_types::provider::ProviderId;

/// Show which providers have a local credential and, if a proxy answers
/// at `proxy_url`, which ones it reports as configured.
pub async fn status(proxy_url: &str, json: bool) -> Result<()> {
    let local = Credentials::from_env();
    let remote = match HttpProxyClient::new(proxy_url)?.status().await {
        Ok(map) => Some(map),
        Err(e) => {
            tracing::debug!(error = %e, proxy_url, "proxy status unavailable");
            None
        }
    };

    if json {
        let local_map: ProviderStatusMap = ProviderId::ALL.iter().map(|&p| (p, local.is_present(p))).collect();
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "local": local_map,
            "proxy": {
                "url": proxy_url,
                "reachable": remote.is_some(),
                "providers": remote,
            },
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!("  {} polychat v{}", style("◆").cyan(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Local credentials ──").dim());
    for id in ProviderId::ALL {
        println!(
            "  {} {:<11} {}",
            mark(local.is_present(id)),
            id.display_name(),
            style(id.api_key_env()).dim()
        );
    }
    println!();

    println!("  {} {}", style("── Proxy ──").dim(), style(proxy_url).cyan());
    match remote {
        Some(map) => {
            for id in ProviderId::ALL {
                let ok = map.get(&id).copied().unwrap_or(false);
                println!("  {} {}", mark(ok), id.display_name());
            }
        }
        None => println!("  {} {}", mark(false), style("unreachable").red()),
    }
    println!();

    Ok(())
}
