// BMCTrace - Counterexample Trace Reconstruction
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Serve command - run the HTTP interface until interrupted

use bmctrace_webui::WebUiConfig;
use clap::Args;
use eyre::Result;
use tracing::info;

use crate::config::Config;

/// Arguments of `bmctrace serve`
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Interface to bind (default from the config file, then 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default from the config file, then 5000)
    #[arg(long, env = "BMCTRACE_PORT")]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Merge the flags over the configuration file
    pub fn webui_config(self, config: &Config) -> WebUiConfig {
        WebUiConfig {
            host: self.host.unwrap_or_else(|| config.server.host.clone()),
            port: self.port.unwrap_or(config.server.port),
            parse: config.parser.clone(),
            harness: config.harness,
        }
    }
}

/// Serve until Ctrl+C or a server failure
pub async fn run_serve(args: ServeArgs, config: &Config) -> Result<()> {
    let webui_config = args.webui_config(config);
    info!("Serving on {}:{}", webui_config.host, webui_config.port);

    tokio::select! {
        result = bmctrace_webui::api::start_webui(webui_config) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
