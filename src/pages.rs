// src/pages.rs

use crate::config::FirebaseConfig;

/// Pinned version of the client-side Firebase JS SDK.
const FIREBASE_SDK_VERSION: &str = "11.3.0";

/// Renders the home page for the given project settings.
pub fn home_page(config: &FirebaseConfig) -> String {
    render(HOME_TEMPLATE, config)
}

/// Renders the profile page for the given project settings.
pub fn profile_page(config: &FirebaseConfig) -> String {
    render(PROFILE_TEMPLATE, config)
}

fn render(template: &str, config: &FirebaseConfig) -> String {
    template
        .replace("__SDK_VERSION__", FIREBASE_SDK_VERSION)
        .replace("__API_KEY__", &config.api_key)
        .replace("__AUTH_DOMAIN__", &config.auth_domain)
        .replace("__PROJECT_ID__", &config.project_id)
        .replace("__EMULATOR_CONNECT__", &emulator_connect_snippet(config))
}

/// JS to connect the client SDK to the Auth emulator after `getAuth()`.
/// Empty when the emulator is not configured.
fn emulator_connect_snippet(config: &FirebaseConfig) -> String {
    match &config.emulator_host {
        Some(host) => format!(
            "\n        connectAuthEmulator(auth, \"http://{host}\", {{ disableWarnings: true }});\n"
        ),
        None => String::new(),
    }
}

const HOME_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Hello, World!</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; max-width: 600px; margin: 40px auto; padding: 0 20px; }
        .auth-section { margin-top: 20px; padding: 20px; border: 1px solid #ddd; border-radius: 8px; }
        .user-info { display: flex; align-items: center; gap: 12px; }
        .btn { padding: 10px 24px; font-size: 16px; border: none; border-radius: 6px; cursor: pointer; }
        .btn-signin { background: #4285f4; color: white; }
        .btn-signin:hover { background: #3367d6; }
        .btn-signout { background: #f44336; color: white; }
        .btn-signout:hover { background: #d32f2f; }
        .btn-profile { background: #4caf50; color: white; text-decoration: none; display: inline-block; }
        .btn-profile:hover { background: #388e3c; }
        #loading { color: #666; }
        #error-msg { color: #f44336; margin-top: 10px; display: none; }
    </style>
</head>
<body>
    <h1>Hello, World!</h1>

    <div class="auth-section">
        <div id="loading">Loading...</div>
        <div id="signed-out" style="display:none">
            <p>You are not signed in.</p>
            <button class="btn btn-signin" id="signin-btn">Sign in with Google</button>
        </div>
        <div id="signed-in" style="display:none">
            <div class="user-info">
                <span>Welcome, <strong id="user-name"></strong></span>
            </div>
            <div style="margin-top: 12px; display: flex; gap: 8px;">
                <a href="/profile" class="btn btn-profile">View Profile</a>
                <button class="btn btn-signout" id="signout-btn">Sign out</button>
            </div>
        </div>
        <div id="error-msg"></div>
    </div>

    <script type="module">
        import { initializeApp } from "https://www.gstatic.com/firebasejs/__SDK_VERSION__/firebase-app.js";
        import { getAuth, connectAuthEmulator, signInWithPopup, GoogleAuthProvider, onAuthStateChanged, signOut } from "https://www.gstatic.com/firebasejs/__SDK_VERSION__/firebase-auth.js";

        const firebaseConfig = {
            apiKey: "__API_KEY__",
            authDomain: "__AUTH_DOMAIN__",
            projectId: "__PROJECT_ID__"
        };

        const app = initializeApp(firebaseConfig);
        const auth = getAuth(app);
__EMULATOR_CONNECT__        const provider = new GoogleAuthProvider();

        const loadingEl = document.getElementById("loading");
        const signedOutEl = document.getElementById("signed-out");
        const signedInEl = document.getElementById("signed-in");
        const userNameEl = document.getElementById("user-name");
        const errorEl = document.getElementById("error-msg");

        onAuthStateChanged(auth, (user) => {
            loadingEl.style.display = "none";
            if (user) {
                userNameEl.textContent = user.displayName || user.email;
                signedInEl.style.display = "block";
                signedOutEl.style.display = "none";
            } else {
                signedInEl.style.display = "none";
                signedOutEl.style.display = "block";
            }
        });

        document.getElementById("signin-btn").addEventListener("click", async () => {
            try {
                await signInWithPopup(auth, provider);
            } catch (err) {
                if (err.code === "auth/popup-closed-by-user" || err.code === "auth/cancelled-popup-request") {
                    return; // User cancelled, not an error
                }
                errorEl.textContent = "Sign-in failed: " + err.message;
                errorEl.style.display = "block";
            }
        });

        document.getElementById("signout-btn").addEventListener("click", async () => {
            try {
                await signOut(auth);
            } catch (err) {
                errorEl.textContent = "Sign-out failed: " + err.message;
                errorEl.style.display = "block";
            }
        });
    </script>
</body>
</html>"##;

const PROFILE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Profile</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; max-width: 600px; margin: 40px auto; padding: 0 20px; }
        .profile-card { padding: 24px; border: 1px solid #ddd; border-radius: 8px; }
        .profile-header { display: flex; align-items: center; gap: 16px; margin-bottom: 16px; }
        .profile-pic { width: 80px; height: 80px; border-radius: 50%; object-fit: cover; background: #e0e0e0; }
        .placeholder-pic { width: 80px; height: 80px; border-radius: 50%; background: #9e9e9e; display: flex; align-items: center; justify-content: center; color: white; font-size: 32px; }
        .profile-details { margin-top: 12px; }
        .profile-details dt { font-weight: bold; color: #555; margin-top: 8px; }
        .profile-details dd { margin-left: 0; }
        .btn { padding: 10px 24px; font-size: 16px; border: none; border-radius: 6px; cursor: pointer; }
        .btn-signout { background: #f44336; color: white; margin-top: 16px; }
        .btn-signout:hover { background: #d32f2f; }
        .btn-home { background: #2196f3; color: white; text-decoration: none; display: inline-block; margin-top: 16px; margin-right: 8px; }
        .btn-home:hover { background: #1976d2; }
        #loading { color: #666; }
        #error-msg { color: #f44336; margin-top: 10px; display: none; }
    </style>
</head>
<body>
    <h1>Profile</h1>

    <div id="loading">Loading profile...</div>
    <div id="profile-card" class="profile-card" style="display:none">
        <div class="profile-header">
            <div id="pic-container"></div>
            <div>
                <h2 id="profile-name" style="margin:0"></h2>
                <p id="profile-email" style="margin:4px 0 0 0; color:#666"></p>
            </div>
        </div>
        <dl class="profile-details">
            <dt>User ID</dt>
            <dd id="profile-uid"></dd>
        </dl>
        <div>
            <a href="/" class="btn btn-home">Home</a>
            <button class="btn btn-signout" id="signout-btn">Sign out</button>
        </div>
    </div>
    <div id="error-msg"></div>

    <script type="module">
        import { initializeApp } from "https://www.gstatic.com/firebasejs/__SDK_VERSION__/firebase-app.js";
        import { getAuth, connectAuthEmulator, signInWithPopup, GoogleAuthProvider, onAuthStateChanged, signOut } from "https://www.gstatic.com/firebasejs/__SDK_VERSION__/firebase-auth.js";

        const firebaseConfig = {
            apiKey: "__API_KEY__",
            authDomain: "__AUTH_DOMAIN__",
            projectId: "__PROJECT_ID__"
        };

        const app = initializeApp(firebaseConfig);
        const auth = getAuth(app);
__EMULATOR_CONNECT__        const provider = new GoogleAuthProvider();

        const loadingEl = document.getElementById("loading");
        const profileCard = document.getElementById("profile-card");
        const errorEl = document.getElementById("error-msg");

        onAuthStateChanged(auth, async (user) => {
            if (!user) {
                // Unauthenticated: start sign-in right away
                loadingEl.textContent = "Redirecting to sign in...";
                try {
                    await signInWithPopup(auth, provider);
                } catch (err) {
                    if (err.code === "auth/popup-closed-by-user" || err.code === "auth/cancelled-popup-request") {
                        loadingEl.textContent = "Sign-in was cancelled. Please sign in to view your profile.";
                        return;
                    }
                    errorEl.textContent = "Sign-in failed: " + err.message;
                    errorEl.style.display = "block";
                    loadingEl.style.display = "none";
                }
                return;
            }

            // Authenticated: fetch the profile from the API
            try {
                const idToken = await user.getIdToken();
                const resp = await fetch("/api/me", {
                    headers: { "Authorization": "Bearer " + idToken }
                });

                if (!resp.ok) {
                    const errData = await resp.json();
                    throw new Error(errData.error?.message || "Failed to load profile");
                }

                const profile = await resp.json();
                document.getElementById("profile-name").textContent = profile.name || "Unknown";
                document.getElementById("profile-email").textContent = profile.email || "";
                document.getElementById("profile-uid").textContent = profile.uid || "";

                const picContainer = document.getElementById("pic-container");
                if (profile.picture) {
                    picContainer.innerHTML = '<img class="profile-pic" src="' + profile.picture + '" alt="Profile picture" referrerpolicy="no-referrer">';
                } else {
                    const initial = (profile.name || "?")[0].toUpperCase();
                    picContainer.innerHTML = '<div class="placeholder-pic">' + initial + '</div>';
                }

                loadingEl.style.display = "none";
                profileCard.style.display = "block";
            } catch (err) {
                errorEl.textContent = "Error loading profile: " + err.message;
                errorEl.style.display = "block";
                loadingEl.style.display = "none";
            }
        });

        document.getElementById("signout-btn").addEventListener("click", async () => {
            try {
                await signOut(auth);
                // onAuthStateChanged fires again and re-initiates sign-in
            } catch (err) {
                errorEl.textContent = "Sign-out failed: " + err.message;
                errorEl.style.display = "block";
            }
        });
    </script>
</body>
</html>"##;
