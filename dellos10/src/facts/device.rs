//! System facts and switch image management.

use log::{info, warn};
use serde::Serialize;

use super::{first_value, for_each_document};
use crate::convert::{UNKNOWN, convert_int, or_unknown};
use crate::driver::{Os10Driver, Session};
use crate::error::Result;
use crate::platform::dellos10::{
    CONFIG_MODIFIED, IMAGE_URL_FORMAT_MSG, IMAGE_URL_SCHEMES, ILLEGAL_PARAMETER, IN_PROGRESS,
    PROCEED_TO_REBOOT,
};
use crate::telemetry::get;

const VERSION_PATH: &str = "./data/system-sw-state/sw-version/";
const STATUS_PATH: &str = "./data/system-state/system-status/";
const MFG_INFO_PATH: &str = "./data/system/node/mfg-info/";
const UPGRADE_STATUS_PATH: &str = "./data/system-sw-state/software-upgrade-status/";

const INSTALL_STARTED: &str = "Image install process started, use get_image_status for updates";
const INSTALL_FAILED: &str = "Image install process not started or failed";
const UPGRADE_STARTED: &str = "Image upgrade process started, use get_image_status for updates";
const UPGRADE_FAILED: &str = "Image upgrade process not started or failed";

/// Basic device facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facts {
    pub uptime: i64,
    pub vendor: String,
    pub os_version: String,
    pub serial_number: String,
    pub model: String,
    pub hostname: String,
    pub fqdn: String,
    pub interface_list: Vec<String>,
}

/// Progress of an image download and install.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStatus {
    pub file_transfer_status: FileTransferStatus,
    pub image_install_status: ImageInstallStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileTransferStatus {
    pub task_state: String,
    pub progress_percent: String,
    pub task_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInstallStatus {
    pub task_state: String,
    pub task_status: String,
}

/// Build [`Facts`] from the `show version`, `show inventory` and
/// `show interface` replies.
pub fn parse_facts(version: &str, inventory: &str, interfaces: &str) -> Result<Facts> {
    let field =
        |raw: &str, path: String| -> Result<String> { Ok(or_unknown(&first_value(raw, &path)?)) };

    let uptime = first_value(version, &format!("{STATUS_PATH}uptime"))?;

    let mut interface_list = Vec::new();
    for_each_document(interfaces, |doc| {
        for interface in doc.get_all("./bulk/data/interface") {
            let name = get(interface, "name");
            if !name.is_empty() {
                interface_list.push(name);
            }
        }
    })?;

    Ok(Facts {
        uptime: convert_int(uptime.as_str()),
        vendor: "Dell".to_string(),
        os_version: field(version, format!("{VERSION_PATH}sw-version"))?,
        serial_number: field(inventory, format!("{MFG_INFO_PATH}service-tag"))?,
        model: field(version, format!("{VERSION_PATH}sw-platform"))?,
        hostname: field(version, format!("{STATUS_PATH}hostname"))?,
        fqdn: UNKNOWN.to_string(),
        interface_list,
    })
}

/// Build [`ImageStatus`] from the `show image status` reply.
pub fn parse_image_status(raw: &str) -> Result<ImageStatus> {
    let transfer = format!("{UPGRADE_STATUS_PATH}file-transfer-status/");
    let install = format!("{UPGRADE_STATUS_PATH}software-install-status/");
    let field = |path: String| -> Result<String> { Ok(or_unknown(&first_value(raw, &path)?)) };

    Ok(ImageStatus {
        file_transfer_status: FileTransferStatus {
            task_state: field(format!("{transfer}task-state"))?,
            progress_percent: field(format!("{transfer}file-progress"))?,
            task_status: field(format!("{transfer}task-state-detail"))?,
        },
        image_install_status: ImageInstallStatus {
            task_state: field(format!("{install}task-state"))?,
            task_status: field(format!("{install}task-state-detail"))?,
        },
    })
}

fn is_supported_image_url(url: &str) -> bool {
    IMAGE_URL_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

impl<S: Session> Os10Driver<S> {
    /// Hostname, version, model, serial number, uptime and interface names.
    pub async fn get_facts(&mut self) -> Result<Facts> {
        let version = self.dispatch("show version | display-xml").await?;
        let inventory = self.dispatch("show inventory | display-xml").await?;
        let interfaces = self.dispatch("show interface | display-xml").await?;
        parse_facts(&version, &inventory, &interfaces)
    }

    /// State of the last image download and install.
    pub async fn get_image_status(&mut self) -> Result<ImageStatus> {
        let output = self.dispatch("show image status | display-xml").await?;
        parse_image_status(&output)
    }

    /// Start `image install <url>`. Returns a human-readable outcome; an
    /// unsupported URL yields the illegal-parameter help text without
    /// reaching the device.
    pub async fn install_switch_image(&mut self, image_file_url: &str) -> Result<String> {
        if !is_supported_image_url(image_file_url) {
            return Ok(IMAGE_URL_FORMAT_MSG.to_string());
        }

        let output = self
            .session
            .send_command_timing(&format!("image install {image_file_url}"))
            .await?;
        if output.contains(ILLEGAL_PARAMETER) {
            return Ok(IMAGE_URL_FORMAT_MSG.to_string());
        }

        self.image_task_outcome(INSTALL_STARTED, INSTALL_FAILED).await
    }

    /// Start `image upgrade <url>`, answering the save and reboot questions.
    ///
    /// With `save_config` the running configuration is saved when the device
    /// asks; otherwise unsaved changes are dropped by the reboot.
    pub async fn upgrade_switch_image(
        &mut self,
        image_file_url: &str,
        save_config: bool,
    ) -> Result<String> {
        if !is_supported_image_url(image_file_url) {
            return Ok(IMAGE_URL_FORMAT_MSG.to_string());
        }

        let mut output = self
            .session
            .send_command_timing(&format!("image upgrade {image_file_url}"))
            .await?;
        if output.contains(ILLEGAL_PARAMETER) {
            return Ok(IMAGE_URL_FORMAT_MSG.to_string());
        }

        if output.contains(CONFIG_MODIFIED) {
            let answer = if save_config { "yes" } else { "no" };
            output = self.session.send_command_timing(answer).await?;
        }
        if output.contains(PROCEED_TO_REBOOT) {
            info!("image upgrade: confirming reboot");
            self.session.send_command_timing("yes").await?;
        }

        self.image_task_outcome(UPGRADE_STARTED, UPGRADE_FAILED).await
    }

    async fn image_task_outcome(&mut self, started: &str, failed: &str) -> Result<String> {
        let status = self.dispatch("show image status").await?;
        if status.contains(IN_PROGRESS) {
            Ok(started.to_string())
        } else {
            warn!("image task not running:\n{}", status);
            Ok(failed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::mock::MockSession;

    const VERSION: &str = r#"<?xml version="1.0"?>
<rpc-reply>
  <data>
    <system-sw-state>
      <sw-version>
        <sw-version>10.5.2.0</sw-version>
        <sw-platform>S5248F-ON</sw-platform>
      </sw-version>
    </system-sw-state>
    <system-state>
      <system-status>
        <hostname>leaf1</hostname>
        <uptime>183735</uptime>
      </system-status>
    </system-state>
  </data>
</rpc-reply>"#;

    const INVENTORY: &str = r#"<?xml version="1.0"?>
<rpc-reply><data><system><node><mfg-info><service-tag>7X8YZ12</service-tag></mfg-info></node></system></data></rpc-reply>"#;

    const INTERFACES: &str = r#"<?xml version="1.0"?>
<rpc-reply><bulk><data>
  <interface><name>ethernet1/1/1</name></interface>
  <interface><name>ethernet1/1/2</name></interface>
</data></bulk></rpc-reply>
<?xml version="1.0"?>
<rpc-reply><bulk><data>
  <interface><name>mgmt1/1/1</name></interface>
</data></bulk></rpc-reply>"#;

    #[test]
    fn test_parse_facts() {
        let facts = parse_facts(VERSION, INVENTORY, INTERFACES).unwrap();
        assert_eq!(facts.hostname, "leaf1");
        assert_eq!(facts.os_version, "10.5.2.0");
        assert_eq!(facts.model, "S5248F-ON");
        assert_eq!(facts.serial_number, "7X8YZ12");
        assert_eq!(facts.uptime, 183735);
        assert_eq!(facts.vendor, "Dell");
        assert_eq!(facts.fqdn, "N/A");
        assert_eq!(facts.interface_list, vec!["ethernet1/1/1", "ethernet1/1/2", "mgmt1/1/1"]);
    }

    #[test]
    fn test_parse_facts_missing_fields_are_sentinels() {
        let facts = parse_facts("<rpc-reply><data/></rpc-reply>", "", "").unwrap();
        assert_eq!(facts.hostname, "N/A");
        assert_eq!(facts.serial_number, "N/A");
        assert_eq!(facts.uptime, -1);
        assert!(facts.interface_list.is_empty());
    }

    #[test]
    fn test_parse_image_status() {
        let raw = r#"<?xml version="1.0"?>
<rpc-reply><data><system-sw-state><software-upgrade-status>
  <file-transfer-status>
    <task-state>in-progress</task-state>
    <file-progress>42</file-progress>
    <task-state-detail>Downloading</task-state-detail>
  </file-transfer-status>
  <software-install-status><task-state>idle</task-state></software-install-status>
</software-upgrade-status></system-sw-state></data></rpc-reply>"#;
        let status = parse_image_status(raw).unwrap();
        assert_eq!(status.file_transfer_status.progress_percent, "42");
        assert_eq!(status.file_transfer_status.task_status, "Downloading");
        assert_eq!(status.image_install_status.task_state, "idle");
        assert_eq!(status.image_install_status.task_status, "N/A");
    }

    #[tokio::test]
    async fn test_install_rejects_unknown_scheme_locally() {
        let mut driver = Os10Driver::new(MockSession::new(), DriverOptions::default());
        let msg = driver.install_switch_image("gopher://host/os10.bin").await.unwrap();
        assert_eq!(msg, IMAGE_URL_FORMAT_MSG);
        assert!(driver.session.commands.is_empty());
    }

    #[tokio::test]
    async fn test_install_started() {
        let session = MockSession::new()
            .reply("image install http://10.0.0.5/os10.bin", "")
            .reply("show image status", "File Transfer State: In progress");
        let mut driver = Os10Driver::new(session, DriverOptions::default());
        let msg = driver.install_switch_image("http://10.0.0.5/os10.bin").await.unwrap();
        assert_eq!(msg, INSTALL_STARTED);
    }

    #[tokio::test]
    async fn test_install_device_rejects_url() {
        let session = MockSession::new().reply("image install usb://", "% Error: Illegal parameter.");
        let mut driver = Os10Driver::new(session, DriverOptions::default());
        let msg = driver.install_switch_image("usb://").await.unwrap();
        assert_eq!(msg, IMAGE_URL_FORMAT_MSG);
    }

    #[tokio::test]
    async fn test_upgrade_answers_save_and_reboot() {
        let url = "tftp://10.0.0.5/os10.bin";
        let session = MockSession::new()
            .reply(
                &format!("image upgrade {url}"),
                "System configuration has been modified. Save? [yes/no]:",
            )
            .reply("no", "Proceed with upgrade and reboot [confirm yes/no]:")
            .reply("show image status", "Install State: In progress");
        let mut driver = Os10Driver::new(session, DriverOptions::default());
        let msg = driver.upgrade_switch_image(url, false).await.unwrap();
        assert_eq!(msg, UPGRADE_STARTED);
        assert_eq!(
            driver.session.commands,
            vec![format!("image upgrade {url}"), "no".to_string(), "yes".to_string(), "show image status".to_string()]
        );
    }
}
