//! Instance bootstrap (user data) scripts.

use autodeploy_spec::Framework;

/// Shell script run on first boot of a VM for `framework`.
pub fn bootstrap_script(framework: &str, app_port: u16) -> String {
    let install = match framework {
        Framework::NODEJS => {
            "curl -fsSL https://rpm.nodesource.com/setup_18.x | bash -\n\
             dnf install -y nodejs\n\
             npm install -g pm2"
        }
        Framework::PYTHON => {
            "dnf install -y python3 python3-pip\n\
             pip3 install --upgrade pip gunicorn"
        }
        Framework::JAVA => "dnf install -y java-17-amazon-corretto-headless",
        Framework::GO => "dnf install -y golang",
        Framework::DOCKER => {
            "dnf install -y docker\n\
             systemctl enable --now docker\n\
             usermod -a -G docker ec2-user"
        }
        _ => {
            "dnf install -y httpd\n\
             systemctl enable --now httpd"
        }
    };

    format!(
        "#!/bin/bash\nset -euo pipefail\ndnf update -y\n{}\necho \"APP_PORT={}\" >> /etc/environment\n",
        install, app_port
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodejs_script() {
        let script = bootstrap_script("nodejs", 3000);
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("npm install -g pm2"));
        assert!(script.contains("APP_PORT=3000"));
    }

    #[test]
    fn test_unknown_framework_serves_static_content() {
        assert!(bootstrap_script("cobol", 80).contains("httpd"));
    }
}
