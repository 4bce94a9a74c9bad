// src/handlers/ui.rs - The single-page catalog + chat interface.
//
// View glue only: every piece of business logic (selection, context,
// rendering, relay calls) lives behind the JSON API; the inline script here
// just fetches and displays.
use crate::AppState;
use axum::{
    extract::Extension,
    response::Html,
    routing::get,
    Router,
};
use std::sync::Arc;

pub fn ui_routes() -> Router {
    Router::new().route("/", get(advisor_page))
}

pub async fn advisor_page(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    let direction = {
        let controller = state.controller.read().await;
        controller.direction().as_str()
    };

    Html(PAGE_TEMPLATE.replace("__DIR__", direction))
}

const PAGE_TEMPLATE: &str = r###"<!DOCTYPE html>
<html lang="en" dir="__DIR__">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Glow Advisor - Build Your Routine</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #3d3436;
            background: linear-gradient(160deg, #fdf6f2 0%, #f9ece8 50%, #f4e3de 100%);
            min-height: 100vh;
        }

        .container {
            max-width: 1200px;
            margin: 0 auto;
            padding: 0 20px 40px;
        }

        .header {
            display: flex;
            justify-content: space-between;
            align-items: center;
            padding: 1.25rem 0;
        }

        .logo {
            font-size: 1.6rem;
            font-weight: 700;
            color: #b0566a;
        }

        .logo span {
            color: #3d3436;
            font-weight: 400;
        }

        .btn {
            padding: 0.55rem 1.1rem;
            border: none;
            border-radius: 22px;
            font-weight: 600;
            cursor: pointer;
            transition: all 0.25s;
            font-size: 0.9rem;
        }

        .btn-primary {
            background: linear-gradient(135deg, #c96b80, #a94b62);
            color: white;
        }

        .btn-primary:hover:not(:disabled) {
            transform: translateY(-1px);
            box-shadow: 0 4px 16px rgba(169, 75, 98, 0.35);
        }

        .btn-subtle {
            background: rgba(176, 86, 106, 0.1);
            color: #a94b62;
            border: 1px solid rgba(176, 86, 106, 0.3);
        }

        .btn:disabled {
            opacity: 0.5;
            cursor: wait;
        }

        .layout {
            display: grid;
            grid-template-columns: minmax(0, 1fr) 380px;
            gap: 1.5rem;
        }

        @media (max-width: 900px) {
            .layout { grid-template-columns: 1fr; }
        }

        .panel {
            background: rgba(255, 255, 255, 0.85);
            border: 1px solid rgba(176, 86, 106, 0.12);
            border-radius: 14px;
            padding: 1.25rem;
            box-shadow: 0 4px 18px rgba(61, 52, 54, 0.06);
        }

        .panel h2 {
            font-size: 1.05rem;
            margin-bottom: 0.75rem;
            color: #8a4355;
        }

        .filters {
            display: flex;
            gap: 0.75rem;
            margin-bottom: 1rem;
            flex-wrap: wrap;
        }

        .filters select, .filters input {
            padding: 0.55rem 0.8rem;
            border: 1px solid rgba(176, 86, 106, 0.3);
            border-radius: 10px;
            font-size: 0.95rem;
            background: white;
            color: #3d3436;
        }

        .filters input { flex: 1; min-width: 160px; }

        .product-grid {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(170px, 1fr));
            gap: 0.9rem;
        }

        .product-card {
            border: 2px solid transparent;
            border-radius: 12px;
            background: white;
            padding: 0.8rem;
            cursor: pointer;
            transition: border-color 0.2s, transform 0.2s;
            text-align: center;
        }

        .product-card:hover { transform: translateY(-2px); }

        .product-card.selected {
            border-color: #c96b80;
            background: #fdf1f3;
        }

        .product-card img {
            width: 90px;
            height: 90px;
            object-fit: contain;
            margin-bottom: 0.5rem;
        }

        .product-card h3 { font-size: 0.92rem; }
        .product-card .brand { font-size: 0.8rem; color: #9a8d90; }
        .product-card .price { font-size: 0.85rem; color: #a94b62; font-weight: 600; }

        .placeholder-message {
            padding: 2rem;
            text-align: center;
            color: #9a8d90;
            grid-column: 1 / -1;
        }

        .chips {
            display: flex;
            flex-wrap: wrap;
            gap: 0.5rem;
            margin-bottom: 0.75rem;
            min-height: 2rem;
        }

        .chip {
            display: inline-flex;
            align-items: center;
            gap: 0.4rem;
            background: #fdf1f3;
            border: 1px solid rgba(176, 86, 106, 0.3);
            border-radius: 16px;
            padding: 0.25rem 0.7rem;
            font-size: 0.85rem;
        }

        .chip button {
            border: none;
            background: none;
            color: #a94b62;
            font-size: 1rem;
            cursor: pointer;
            line-height: 1;
        }

        .selection-actions { display: flex; gap: 0.5rem; }

        .chat-window {
            height: 320px;
            overflow-y: auto;
            border: 1px solid rgba(176, 86, 106, 0.15);
            border-radius: 10px;
            background: #fffdfd;
            padding: 0.8rem;
            margin-bottom: 0.75rem;
        }

        .msg { margin-bottom: 0.7rem; }
        .msg .who { font-size: 0.75rem; font-weight: 700; color: #8a4355; text-transform: uppercase; }
        .msg .bubble {
            padding: 0.5rem 0.75rem;
            border-radius: 10px;
            background: #f7edef;
            display: inline-block;
            max-width: 95%;
            word-break: break-word;
        }
        .msg.user .bubble { background: #eee7f5; }
        .msg.error .bubble { background: #fbe4e4; color: #8a2f2f; }

        .chat-form { display: flex; gap: 0.5rem; }

        .chat-form input {
            flex: 1;
            padding: 0.6rem 0.8rem;
            border: 1px solid rgba(176, 86, 106, 0.3);
            border-radius: 10px;
            font-size: 0.95rem;
        }

        .sidebar > .panel + .panel { margin-top: 1.5rem; }
    </style>
</head>
<body>
    <div class="container">
        <header class="header">
            <div class="logo">Glow <span>Advisor</span></div>
            <button id="dirToggle" class="btn btn-subtle">Toggle RTL</button>
        </header>

        <div class="layout">
            <section class="panel">
                <h2>Products</h2>
                <div class="filters">
                    <select id="categoryFilter">
                        <option value="">Choose a category</option>
                    </select>
                    <input id="searchInput" type="text" placeholder="Search products...">
                </div>
                <div id="productsContainer" class="product-grid">
                    <div class="placeholder-message">Select a category to view products</div>
                </div>
            </section>

            <aside class="sidebar">
                <section class="panel">
                    <h2>Selected Products</h2>
                    <div id="selectedProductsList" class="chips"></div>
                    <div class="selection-actions">
                        <button id="generateRoutine" class="btn btn-primary">Generate Routine</button>
                        <button id="clearSelection" class="btn btn-subtle">Clear All</button>
                    </div>
                </section>

                <section class="panel">
                    <h2>Ask the Advisor</h2>
                    <div id="chatWindow" class="chat-window"></div>
                    <form id="chatForm" class="chat-form">
                        <input id="chatInput" type="text" placeholder="Ask about routines, products..." autocomplete="off">
                        <button id="chatSend" type="submit" class="btn btn-primary">Send</button>
                    </form>
                </section>
            </aside>
        </div>
    </div>

    <script>
        const categoryFilter = document.getElementById("categoryFilter");
        const searchInput = document.getElementById("searchInput");
        const productsContainer = document.getElementById("productsContainer");
        const selectedProductsList = document.getElementById("selectedProductsList");
        const chatWindow = document.getElementById("chatWindow");
        const chatForm = document.getElementById("chatForm");
        const chatInput = document.getElementById("chatInput");
        const chatSend = document.getElementById("chatSend");
        const generateRoutine = document.getElementById("generateRoutine");
        const clearSelection = document.getElementById("clearSelection");
        const dirToggle = document.getElementById("dirToggle");

        const APOLOGY = "Sorry, I couldn't reach the beauty advisor just now. Please try again.";

        let selectedIds = new Set();
        let visibleProducts = [];

        function renderProducts() {
            if (!visibleProducts.length) {
                productsContainer.innerHTML =
                    '<div class="placeholder-message">No products match - try another category or search</div>';
                return;
            }
            productsContainer.innerHTML = visibleProducts.map(p => `
                <div class="product-card ${selectedIds.has(p.id) ? "selected" : ""}" data-id="${p.id}" role="button" tabindex="0">
                    <img src="${p.image}" alt="">
                    <h3></h3>
                    <p class="brand"></p>
                    ${p.price ? '<p class="price"></p>' : ""}
                </div>
            `).join("");
            // Names and brands are data, not markup: set them as text.
            productsContainer.querySelectorAll(".product-card").forEach((card, i) => {
                const p = visibleProducts[i];
                card.querySelector("h3").textContent = p.name;
                card.querySelector(".brand").textContent = p.brand;
                const price = card.querySelector(".price");
                if (price) price.textContent = p.price;
                card.addEventListener("click", () => toggleProduct(p.id));
                card.addEventListener("keydown", e => {
                    if (e.key === "Enter" || e.key === " ") {
                        e.preventDefault();
                        toggleProduct(p.id);
                    }
                });
            });
        }

        function renderChips(selected) {
            selectedIds = new Set(selected.map(p => p.id));
            if (!selected.length) {
                selectedProductsList.innerHTML =
                    '<div class="placeholder-message" style="padding:0.5rem">No products selected</div>';
            } else {
                selectedProductsList.innerHTML = "";
                selected.forEach(p => {
                    const chip = document.createElement("span");
                    chip.className = "chip";
                    const label = document.createElement("span");
                    label.textContent = p.name;
                    const remove = document.createElement("button");
                    remove.textContent = "×";
                    remove.setAttribute("aria-label", "Remove " + p.name);
                    remove.addEventListener("click", () => toggleProduct(p.id));
                    chip.append(label, remove);
                    selectedProductsList.append(chip);
                });
            }
            renderProducts();
        }

        function appendMessage(cls, who, html) {
            const wrap = document.createElement("div");
            wrap.className = "msg " + cls;
            const label = document.createElement("div");
            label.className = "who";
            label.textContent = who;
            const bubble = document.createElement("div");
            bubble.className = "bubble";
            // Server-sanitized fragment.
            bubble.innerHTML = html;
            wrap.append(label, bubble);
            chatWindow.append(wrap);
            chatWindow.scrollTop = chatWindow.scrollHeight;
        }

        async function loadProducts() {
            const params = new URLSearchParams();
            if (categoryFilter.value) params.set("category", categoryFilter.value);
            if (searchInput.value.trim()) params.set("q", searchInput.value.trim());
            if (!categoryFilter.value && !searchInput.value.trim()) {
                visibleProducts = [];
                productsContainer.innerHTML =
                    '<div class="placeholder-message">Select a category to view products</div>';
                return;
            }
            const res = await fetch("/api/products?" + params);
            const data = await res.json();
            visibleProducts = data.products;
            renderProducts();
        }

        async function toggleProduct(id) {
            const res = await fetch("/api/selection/toggle", {
                method: "POST",
                headers: { "Content-Type": "application/json" },
                body: JSON.stringify({ id }),
            });
            const data = await res.json();
            renderChips(data.selected);
        }

        clearSelection.addEventListener("click", async () => {
            const res = await fetch("/api/selection/clear", { method: "POST" });
            const data = await res.json();
            renderChips(data.selected);
        });

        generateRoutine.addEventListener("click", async () => {
            generateRoutine.disabled = true;
            try {
                const res = await fetch("/api/routine", { method: "POST" });
                const data = await res.json();
                if (res.status === 409) return; // a newer request superseded this one
                if (!res.ok) {
                    appendMessage("error", "Advisor", data.error === "select at least one product first"
                        ? "Select a few products first, then I can build your routine."
                        : APOLOGY);
                    return;
                }
                appendMessage("assistant", "Advisor", data.routine_html);
            } catch (err) {
                appendMessage("error", "Advisor", APOLOGY);
            } finally {
                generateRoutine.disabled = false;
            }
        });

        chatForm.addEventListener("submit", async e => {
            e.preventDefault();
            const message = chatInput.value.trim();
            if (!message || chatSend.disabled) return;
            chatSend.disabled = true;
            try {
                const res = await fetch("/api/chat", {
                    method: "POST",
                    headers: { "Content-Type": "application/json" },
                    body: JSON.stringify({ message }),
                });
                const data = await res.json();
                if (res.status === 409) return; // a newer request superseded this one
                if (!res.ok) {
                    appendMessage("error", "Advisor", APOLOGY);
                    return;
                }
                appendMessage("user", "You", data.message_html);
                appendMessage("assistant", "Advisor", data.reply_html);
                chatInput.value = "";
            } catch (err) {
                appendMessage("error", "Advisor", APOLOGY);
            } finally {
                chatSend.disabled = false;
            }
        });

        dirToggle.addEventListener("click", async () => {
            const next = document.documentElement.dir === "rtl" ? "ltr" : "rtl";
            document.documentElement.dir = next;
            await fetch("/api/direction", {
                method: "POST",
                headers: { "Content-Type": "application/json" },
                body: JSON.stringify({ dir: next }),
            });
        });

        categoryFilter.addEventListener("change", loadProducts);
        searchInput.addEventListener("input", loadProducts);

        async function init() {
            const res = await fetch("/api/products");
            const data = await res.json();
            data.categories.forEach(category => {
                const option = document.createElement("option");
                option.value = category;
                option.textContent = category;
                categoryFilter.append(option);
            });

            const stateRes = await fetch("/api/state");
            const state = await stateRes.json();
            renderChips(state.selected);

            const historyRes = await fetch("/api/chat/history");
            const history = await historyRes.json();
            history.messages.forEach(m => {
                appendMessage(m.role === "user" ? "user" : "assistant",
                    m.role === "user" ? "You" : "Advisor", m.content_html);
            });
        }

        init();
    </script>
</body>
</html>
"###;
