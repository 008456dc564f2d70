//! Fixture repositories shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const SHARED_SCHEME: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Scheme LastUpgradeVersion = "1500" version = "1.7">
   <TestAction buildConfiguration = "Debug">
      <Testables>
         <TestableReference skipped = "NO">
         </TestableReference>
      </Testables>
   </TestAction>
</Scheme>
"#;

pub const FASTFILE: &str = r#"default_platform(:ios)

platform :ios do
  lane :test do
    scan
  end

  lane :beta do
    gym
  end
end
"#;

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Gradle project rooted at `location` ("." for the repository root).
pub fn android_project(root: &Path, location: &str, with_wrapper: bool) {
    let base = if location == "." {
        String::new()
    } else {
        format!("{}/", location)
    };
    write(
        root,
        &format!("{}build.gradle", base),
        "buildscript {\n    repositories { google() }\n}\n",
    );
    write(
        root,
        &format!("{}app/build.gradle", base),
        "apply plugin: 'com.android.application'\n",
    );
    if with_wrapper {
        write(root, &format!("{}gradlew", base), "#!/usr/bin/env sh\n");
    }
}

pub fn ios_project(root: &Path, dir: &str, name: &str) {
    write(
        root,
        &format!("{}/{}.xcodeproj/project.pbxproj", dir, name),
        "buildSettings = { SDKROOT = iphoneos; };\n",
    );
    write(
        root,
        &format!(
            "{}/{}.xcodeproj/xcshareddata/xcschemes/{}.xcscheme",
            dir, name, name
        ),
        SHARED_SCHEME,
    );
}

pub fn flutter_project(root: &Path) {
    write(
        root,
        "pubspec.yaml",
        "name: demo\ndependencies:\n  flutter:\n    sdk: flutter\n",
    );
    write(root, "lib/main.dart", "void main() {}\n");
    write(root, "test/widget_test.dart", "void main() {}\n");
    ios_project(root, "ios", "Runner");
    android_project(root, "android", true);
}

pub fn android_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    android_project(dir.path(), ".", true);
    dir
}
