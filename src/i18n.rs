// 🌐 Localization - message key + positional values -> display text
//
// Templates use `{0}`, `{1}`, ... placeholders. Lookup order:
//   user's language -> English -> the raw key
//
// Tables are immutable statics built on first use.

use crate::entities::Language;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

type Table = HashMap<&'static str, &'static str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Translator { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Template without arguments.
    pub fn t(&self, key: &str) -> String {
        self.tr(key, &[])
    }

    /// Template with positional arguments.
    pub fn tr(&self, key: &str, args: &[&dyn fmt::Display]) -> String {
        match lookup(self.language, key) {
            Some(template) => fill(template, args),
            None => key.to_string(),
        }
    }
}

fn table(language: Language) -> &'static Table {
    match language {
        Language::English => &ENGLISH,
        Language::SpanishArgentina => &SPANISH_AR,
    }
}

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    table(language)
        .get(key)
        .or_else(|| ENGLISH.get(key))
        .copied()
}

/// Single pass so substituted values are never re-scanned.
fn fill(template: &str, args: &[&dyn fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();

        let index = if digits > 0 && after[digits..].starts_with('}') {
            after[..digits].parse::<usize>().ok()
        } else {
            None
        };

        match index.and_then(|i| args.get(i)) {
            Some(arg) => {
                out.push_str(&arg.to_string());
                rest = &after[digits + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// ENGLISH
// ============================================================================

static ENGLISH: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        // Start / lobby
        ("welcome_back", "👋 Welcome back, {0}!\n\n*Your Lobby:*\nLobby ID: `{1}`\nAccount Type: {2}\n{3}\n\nUse /help to see all available commands."),
        ("lobby_created", "👋 Welcome to the Couple Expense Tracker!\n\nHi {0}! I've created a new lobby for you.\n\n*Your Lobby Details:*\nLobby ID: `{1}`\nAccount Type: {2}\n\n*Next Steps:*\n1. Share this invitation token with your partner: `{3}`\n2. Your partner should run: `/start {3}`\n3. Once both are in, start adding expenses with `/add`\n\nUse /help to see all available commands."),
        ("lobby_created_group", "👋 Welcome to the Couple Expense Tracker!\n\nHi {0}! I've created a lobby for this group.\n\n*Lobby Details:*\nLobby ID: `{1}`\nAccount Type: {2}\n\nYour partner can join by running `/start` in this group.\n\nUse /help to see all available commands."),
        ("lobby_ready_group", "✅ Lobby is ready!\n\n*Lobby Details:*\nLobby ID: `{0}`\nAccount Type: {1}\n{2}\n\nYou can now start adding expenses with `/add`\n\nUse /help to see all available commands."),
        ("lobby_joined_token", "✅ Successfully joined the lobby!"),
        ("waiting_partner", "Waiting for partner to join..."),
        ("partner_line", "Partner: {0}"),
        ("lobby_security_info", "🔒 *Security Information:*\n\nYour lobby is protected by an invitation token. Share this token ONLY with your partner:\n\n`{0}`\n\n*How to join:*\nYour partner should run:\n`/start {0}`\n\n⚠️ Keep this token private! Anyone with this token can join your lobby."),
        ("language_prompt", "🌐 Please choose your language / Elegí tu idioma:"),

        // Errors
        ("error_lobby_not_found", "❌ You're not in a lobby yet. Use /start to create or join one."),
        ("error_lobby_full", "❌ This lobby is already full."),
        ("error_already_member", "❌ You are already in this lobby."),
        ("error_token_different_chat", "❌ This invitation token is for a different chat."),
        ("error_token_group_chat", "❌ This invitation token is for a group chat. Please join from that group."),
        ("error_invalid_token", "❌ Invalid or expired invitation token. Please ask your partner for a new invitation."),
        ("error_not_owner", "❌ Only the lobby creator can do this."),
        ("error_unknown_command", "Unknown command /{0}. Use /help to see available commands."),
        ("error_unknown_callback", "Unknown action."),
        ("error_invalid_user_id", "❌ Invalid user ID. Use 'user1', 'user2', 'partner', or a valid user ID from your lobby."),
        ("error_partner_missing", "❌ Your partner hasn't joined the lobby yet."),
        ("error_invalid_period", "❌ Invalid period format. Use YYYY-MM"),
        ("error_invalid_date", "❌ Invalid date: {0}. Use YYYY-MM-DD"),
        ("error_not_found", "❌ Not found: {0}"),
        ("error_storage", "❌ Something went wrong while saving your data. Please try again."),

        // Help
        ("help", "📚 *Available Commands:*\n\n*Basic Commands:*\n/start - Initialize bot and create/join lobby\n/help - Show this help message\n\n*Expense Management:*\n/add <amount> <description> [category] [payment_method] [spender] - Add an expense\n/list [month | start end] - List expenses (current month by default)\n/list_billing <payment_method> [period] - List expenses by billing cycle\n/delete [expense_id] - Delete an expense (shows recent expenses if no ID provided)\n/edit <expense_id> <field> <value> - Edit an expense (fields: amount, description, category, date, payment_method)\n\n*Reports & Analysis:*\n/summary [month | start end] - Get spending summary\n/summary_billing <payment_method> [period] - Get summary by billing cycle\n/settle [month | start end] - Calculate who owes whom\n/settle_billing <payment_method> [period] - Calculate settlement for a billing period\n/analyze - Compare this month with the previous one\n\n*Configuration:*\n/payment_methods - Manage payment methods\n  `/payment_methods add Visa credit_card 15`\n  `/payment_methods edit 1 closing_day 20`\n  `/payment_methods delete 1`\n/settings - Configure account type and salary percentages\n  `/settings account_type shared`\n  `/settings salary 0.6 0.4`\n/language [code] - Show or change language\n/invite - Show the invitation token\n/regenerate_invite - Create a new invitation token"),

        // Settings
        ("settings_current", "⚙️ *Current Lobby Settings*\n\nLobby ID: `{0}`\nAccount Type: `{1}`\nUser 1 Salary: {2}\nUser 2 Salary: {3}\n\n*To change settings:*\n`/settings account_type <separate|shared>`\n`/settings salary <user1_pct> <user2_pct>`"),
        ("settings_updated", "✅ Settings updated successfully!"),
        ("settings_usage", "❌ Usage: `/settings account_type <separate|shared>`"),
        ("settings_invalid_type", "❌ Account type must be 'separate' or 'shared'"),
        ("settings_salary_usage", "❌ Usage: `/settings salary <user1_percentage> <user2_percentage>`\nExample: `/settings salary 0.6 0.4`"),
        ("settings_invalid_pct", "❌ Invalid percentage values. Use numbers between 0 and 1."),
        ("settings_pct_range", "❌ Percentages must be between 0 and 1."),
        ("settings_unknown", "❌ Unknown setting. Use `account_type` or `salary`."),

        // Payment methods
        ("payment_methods_none", "📋 No payment methods configured.\n\nAdd one with:\n`/payment_methods add <name> <type> [closing_day]`\n\nTypes: credit_card, debit_card, cash, bank_transfer, other"),
        ("payment_methods_list", "📋 *Payment Methods:*\n\n{0}"),
        ("payment_method_item", "{0} #{1} *{2}* ({3})"),
        ("payment_method_closing", " - Closes on {0}"),
        ("payment_method_owner", " - Owner: {0}"),
        ("payment_method_added", "✅ Payment method *{0}* created successfully! (ID {1})"),
        ("payment_method_closing_day", "\nClosing day: {0}"),
        ("payment_method_add_usage", "❌ Usage: `/payment_methods add <name> <type> [closing_day]`\n\nTypes: credit_card, debit_card, cash, bank_transfer, other\nExample: `/payment_methods add Visa credit_card 15`"),
        ("payment_method_closing_required", "❌ Credit cards require a closing day. Usage: `/payment_methods add <name> credit_card <closing_day>`"),
        ("payment_method_closing_invalid", "❌ Closing day must be a number between 1 and 31"),
        ("payment_method_invalid_type", "❌ Unknown payment method type: {0}. Types: credit_card, debit_card, cash, bank_transfer, other"),
        ("payment_method_duplicate", "❌ A payment method named '{0}' already exists."),
        ("payment_method_empty_name", "❌ Payment method name must not be empty."),
        ("payment_method_not_found", "⚠️ Payment method '{0}' not found."),
        ("payment_method_not_found_list", "⚠️ Payment method '{0}' not found.\n\nAvailable methods:\n{1}"),
        ("payment_method_edit_usage", "❌ Usage: `/payment_methods edit <id> <field> <value>`\n\nFields: name, type, closing_day, owner, active\nExample: `/payment_methods edit 1 closing_day 20`"),
        ("payment_method_delete_usage", "❌ Usage: `/payment_methods delete <id>`"),
        ("payment_method_invalid_id", "❌ Invalid payment method ID"),
        ("payment_method_updated", "✅ Payment method updated successfully!"),
        ("payment_method_deleted", "✅ Payment method deleted successfully!"),
        ("payment_method_unknown_action", "❌ Unknown action. Use: `add`, `edit`, or `delete`"),

        // Expenses
        ("expense_add_usage", "❌ Usage: `/add <amount> <description> [category] [payment_method] [spender]`\n\nExamples:\n`/add 50.00 Groceries`\n`/add 25.50 Dinner Food Visa`\n`/add 25.50 Dinner Food Visa partner`"),
        ("expense_invalid_amount", "❌ Invalid amount. Please provide a positive number."),
        ("expense_added", "✅ Expense #{0} added!\n\nAmount: {1}\nDescription: {2}\n"),
        ("expense_category", "Category: {0}\n"),
        ("expense_payment_method", "Payment Method: {0}\n"),
        ("expense_spender", "Paid by: {0}\n"),
        ("expense_billing_period", "Billing Period: {0} to {1}\n"),
        ("expense_list_none", "📋 No expenses found for {0}."),
        ("expense_list_header", "📋 *Expenses* ({0})\n\n"),
        ("expense_list_item", "• #{0} {1} - {2}\n"),
        ("expense_list_category", "  Category: {0}\n"),
        ("expense_list_date", "  Date: {0}\n\n"),
        ("expense_list_spender", "  Paid by: {0}\n"),
        ("expense_list_payment_method", "  Payment Method: {0}\n"),
        ("expense_billing_item", "• #{0} {1} - {2} ({3})\n"),
        ("expense_delete_hint", "Use `/delete <expense_id>` to delete one of them."),
        ("expense_list_total", "*Total: {0}*"),
        ("expense_no_description", "No description"),
        ("expense_billing_usage", "❌ Usage: `/list_billing <payment_method> [period]`\n\nExample: `/list_billing Visa 2024-01`"),
        ("expense_billing_no_cycle", "❌ This payment method doesn't have a billing cycle configured."),
        ("expense_billing_none", "📋 No expenses found for billing period {0} to {1}."),
        ("expense_billing_header", "📋 *Billing Period Expenses*\nPayment Method: {0}\nPeriod: {1} to {2}\n\n"),
        ("expense_delete_usage", "❌ Usage: `/delete <expense_id>`\n\nExample: `/delete 123`"),
        ("expense_delete_none", "📋 No expenses found to delete."),
        ("expense_delete_list_header", "📋 *Recent Expenses (Last 10):*\n\n"),
        ("expense_delete_invalid_id", "❌ Invalid expense ID. Usage: `/delete <expense_id>`"),
        ("expense_not_found", "❌ Expense not found or doesn't belong to your lobby."),
        ("expense_deleted", "✅ Expense deleted successfully!"),
        ("expense_edit_usage", "❌ Usage: `/edit <expense_id> <field> <value>`\n\nFields: `amount`, `description`, `category`, `date`, `payment_method`\n\nExamples:\n`/edit 123 category Groceries`\n`/edit 123 payment_method Visa`"),
        ("expense_edit_invalid_id", "❌ Invalid expense ID. Usage: `/edit <expense_id> <field> <value>`"),
        ("expense_edit_invalid_field", "❌ Invalid field. Use `amount`, `description`, `category`, `date` or `payment_method`."),
        ("expense_edited", "✅ Expense updated successfully!"),

        // Settlement
        ("settle_usage", "❌ Usage: `/settle_billing <payment_method> [period]`\n\nExample: `/settle_billing Visa 2024-01`"),
        ("settle_report", "💰 *Settlement Report*\n\nPeriod: {0}\nAccount Type: {1}\nTotal Expenses: {2}\n\n"),
        ("settle_separate", "*Separate Accounts (Equal Split):*\n\n"),
        ("settle_shared", "*Shared Account (Salary-based):*\n\n"),
        ("settle_user1_spent", "User 1 Spent: {0}\n"),
        ("settle_user2_spent", "User 2 Spent: {0}\n\n"),
        ("settle_user1_expected", "User 1 Expected ({0}): {1}\n"),
        ("settle_user2_expected", "User 2 Expected ({0}): {1}\n\n"),
        ("settle_expected_per", "Expected per person: {0}\n\n"),
        ("settle_user1_owes", "➡️ User 1 owes User 2: {0}\n"),
        ("settle_user2_owes", "➡️ User 2 owes User 1: {0}\n"),
        ("settle_all_settled", "✅ All settled! No debts.\n"),

        // Summary
        ("summary_none", "📊 *Summary*\n\nNo expenses found for {0}."),
        ("summary_header", "📊 *Spending Summary*\n\nPeriod: {0}\nTotal Expenses: {1}\nNumber of Expenses: {2}\n\n"),
        ("summary_by_person", "*By Person:*\n"),
        ("summary_person_item", "{0}: {1} ({2})\n"),
        ("summary_by_category", "*By Category:*\n"),
        ("summary_category_item", "• {0}: {1} ({2})\n"),
        ("summary_by_payment", "*By Payment Method:*\n"),
        ("summary_billing_usage", "❌ Usage: `/summary_billing <payment_method> [period]`\n\nExample: `/summary_billing Visa 2024-01`"),
        ("summary_period", "the selected period"),
        ("period_range", "{0} to {1}"),

        // Analysis
        ("analyze_header", "📈 *Monthly Spending Analysis*\n\nCurrent Period: {0}\nPrevious Period: {1}\n\n"),
        ("analyze_overall", "*Overall Spending:*\n"),
        ("analyze_current", "Current: {0}\n"),
        ("analyze_previous", "Previous: {0}\n"),
        ("analyze_increase", "📈 Increase: {0}\n\n"),
        ("analyze_decrease", "📉 Decrease: {0}\n\n"),
        ("analyze_no_change", "➡️ No change\n\n"),
        ("analyze_spikes", "*⚠️ Spending Spikes (>20% increase):*\n"),
        ("analyze_spike_item", "• {0}: {1} (+{2})\n"),
        ("analyze_new_categories", "*🆕 New Categories:*\n"),
        ("analyze_new_category", "• {0}\n"),
        ("analyze_discontinued", "*❌ Discontinued Categories:*\n"),
        ("analyze_top_changes", "*Top Category Changes:*\n"),
        ("analyze_change_item", "• {0}: {1} → {2} ({3})\n"),

        // Language
        ("language_current", "🌐 Current language: {0}\n\nAvailable languages:\n{1}"),
        ("language_changed", "✅ Language changed to {0}"),
        ("language_invalid", "❌ Invalid language code. Available: {0}"),

        // Invite
        ("invite_info", "🔗 *Invitation Token*\n\n`{0}`\n\nYour partner should run:\n`/start {0}`"),
        ("invite_full", "✅ Your lobby is complete. No invitation needed."),
        ("invite_group", "👥 In a group, your partner only needs to run `/start` here."),
        ("invite_regenerated", "🔄 New invitation token:\n\n`{0}`\n\nThe previous token no longer works."),
    ])
});

// ============================================================================
// SPANISH (ARGENTINA)
// ============================================================================

static SPANISH_AR: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        // Start / lobby
        ("welcome_back", "👋 ¡Bienvenido de nuevo, {0}!\n\n*Tu Lobby:*\nID del Lobby: `{1}`\nTipo de Cuenta: {2}\n{3}\n\nUsá /help para ver todos los comandos disponibles."),
        ("lobby_created", "👋 ¡Bienvenido al Registro de Gastos en Pareja!\n\n¡Hola {0}! Creé un nuevo lobby para vos.\n\n*Detalles de tu Lobby:*\nID del Lobby: `{1}`\nTipo de Cuenta: {2}\n\n*Próximos Pasos:*\n1. Compartí este token de invitación con tu pareja: `{3}`\n2. Tu pareja debería ejecutar: `/start {3}`\n3. Una vez que ambos estén, empezá a agregar gastos con `/add`\n\nUsá /help para ver todos los comandos disponibles."),
        ("lobby_created_group", "👋 ¡Bienvenido al Registro de Gastos en Pareja!\n\n¡Hola {0}! Creé un lobby para este grupo.\n\n*Detalles del Lobby:*\nID del Lobby: `{1}`\nTipo de Cuenta: {2}\n\nTu pareja puede unirse ejecutando `/start` en este grupo.\n\nUsá /help para ver todos los comandos disponibles."),
        ("lobby_ready_group", "✅ ¡El lobby está listo!\n\n*Detalles del Lobby:*\nID del Lobby: `{0}`\nTipo de Cuenta: {1}\n{2}\n\nYa podés empezar a agregar gastos con `/add`\n\nUsá /help para ver todos los comandos disponibles."),
        ("lobby_joined_token", "✅ ¡Te uniste exitosamente al lobby!"),
        ("waiting_partner", "Esperando que se una tu pareja..."),
        ("partner_line", "Pareja: {0}"),
        ("lobby_security_info", "🔒 *Información de Seguridad:*\n\nTu lobby está protegido por un token de invitación. Compartí este token SOLO con tu pareja:\n\n`{0}`\n\n*Cómo unirse:*\nTu pareja debería ejecutar:\n`/start {0}`\n\n⚠️ ¡Mantené este token privado! Cualquiera con este token puede unirse a tu lobby."),

        // Errors
        ("error_lobby_not_found", "❌ Todavía no estás en un lobby. Usá /start para crear o unirte a uno."),
        ("error_lobby_full", "❌ Este lobby ya está completo."),
        ("error_already_member", "❌ Ya estás en este lobby."),
        ("error_token_different_chat", "❌ Este token de invitación es para otro chat."),
        ("error_token_group_chat", "❌ Este token de invitación es para un grupo. Unite desde ese grupo."),
        ("error_invalid_token", "❌ Token de invitación inválido o expirado. Por favor pedile a tu pareja un nuevo token."),
        ("error_not_owner", "❌ Solo quien creó el lobby puede hacer esto."),
        ("error_unknown_command", "Comando desconocido /{0}. Usá /help para ver los comandos disponibles."),
        ("error_unknown_callback", "Acción desconocida."),
        ("error_invalid_user_id", "❌ ID de usuario inválido. Usá 'user1', 'user2', 'partner', o un ID de usuario válido de tu lobby."),
        ("error_partner_missing", "❌ Tu pareja todavía no se unió al lobby."),
        ("error_invalid_period", "❌ Formato de período inválido. Usá YYYY-MM"),
        ("error_invalid_date", "❌ Fecha inválida: {0}. Usá YYYY-MM-DD"),
        ("error_not_found", "❌ No encontrado: {0}"),
        ("error_storage", "❌ Algo salió mal al guardar tus datos. Por favor intentá de nuevo."),

        // Help
        ("help", "📚 *Comandos Disponibles:*\n\n*Comandos Básicos:*\n/start - Inicializar bot y crear/unirse a lobby\n/help - Mostrar este mensaje de ayuda\n\n*Gestión de Gastos:*\n/add <monto> <descripción> [categoría] [método_pago] [quién_pagó] - Agregar un gasto\n/list [mes | inicio fin] - Listar gastos (mes actual por defecto)\n/list_billing <método_pago> [período] - Listar gastos por ciclo de facturación\n/delete [id_gasto] - Eliminar un gasto (muestra gastos recientes si no se proporciona ID)\n/edit <id_gasto> <campo> <valor> - Editar un gasto (campos: amount, description, category, date, payment_method)\n\n*Reportes y Análisis:*\n/summary [mes | inicio fin] - Obtener resumen de gastos\n/summary_billing <método_pago> [período] - Obtener resumen por ciclo de facturación\n/settle [mes | inicio fin] - Calcular quién le debe a quién\n/settle_billing <método_pago> [período] - Calcular liquidación para un período de facturación\n/analyze - Comparar este mes con el anterior\n\n*Configuración:*\n/payment_methods - Gestionar métodos de pago\n  `/payment_methods add Visa credit_card 15`\n  `/payment_methods edit 1 closing_day 20`\n  `/payment_methods delete 1`\n/settings - Configurar tipo de cuenta y porcentajes de sueldo\n  `/settings account_type shared`\n  `/settings salary 0.6 0.4`\n/language [código] - Ver o cambiar idioma\n/invite - Mostrar el token de invitación\n/regenerate_invite - Crear un nuevo token de invitación"),

        // Settings
        ("settings_current", "⚙️ *Configuración Actual del Lobby*\n\nID del Lobby: `{0}`\nTipo de Cuenta: `{1}`\nSueldo Usuario 1: {2}\nSueldo Usuario 2: {3}\n\n*Para cambiar la configuración:*\n`/settings account_type <separate|shared>`\n`/settings salary <user1_pct> <user2_pct>`"),
        ("settings_updated", "✅ ¡Configuración actualizada exitosamente!"),
        ("settings_usage", "❌ Uso: `/settings account_type <separate|shared>`"),
        ("settings_invalid_type", "❌ El tipo de cuenta debe ser 'separate' o 'shared'"),
        ("settings_salary_usage", "❌ Uso: `/settings salary <porcentaje_user1> <porcentaje_user2>`\nEjemplo: `/settings salary 0.6 0.4`"),
        ("settings_invalid_pct", "❌ Valores de porcentaje inválidos. Usá números entre 0 y 1."),
        ("settings_pct_range", "❌ Los porcentajes deben estar entre 0 y 1."),
        ("settings_unknown", "❌ Configuración desconocida. Usá `account_type` o `salary`."),

        // Payment methods
        ("payment_methods_none", "📋 No hay métodos de pago configurados.\n\nAgregá uno con:\n`/payment_methods add <nombre> <tipo> [día_cierre]`\n\nTipos: credit_card (o TarjetaCredito), debit_card (o TarjetaDebito), cash (o Efectivo), bank_transfer (o Transferencia), other (o Otro)"),
        ("payment_methods_list", "📋 *Métodos de Pago:*\n\n{0}"),
        ("payment_method_item", "{0} #{1} *{2}* ({3})"),
        ("payment_method_closing", " - Cierra el día {0}"),
        ("payment_method_owner", " - Dueño: {0}"),
        ("payment_method_added", "✅ ¡Método de pago *{0}* creado exitosamente! (ID {1})"),
        ("payment_method_closing_day", "\nDía de cierre: {0}"),
        ("payment_method_add_usage", "❌ Uso: `/payment_methods add <nombre> <tipo> [día_cierre]`\n\nTipos: credit_card (o TarjetaCredito), debit_card (o TarjetaDebito), cash (o Efectivo), bank_transfer (o Transferencia), other (o Otro)\nEjemplo: `/payment_methods add Visa TarjetaCredito 15`"),
        ("payment_method_closing_required", "❌ Las tarjetas de crédito requieren un día de cierre. Uso: `/payment_methods add <nombre> credit_card <día_cierre>`"),
        ("payment_method_closing_invalid", "❌ El día de cierre debe ser un número entre 1 y 31"),
        ("payment_method_invalid_type", "❌ Tipo de método de pago desconocido: {0}. Tipos: credit_card, debit_card, cash, bank_transfer, other"),
        ("payment_method_duplicate", "❌ Ya existe un método de pago llamado '{0}'."),
        ("payment_method_empty_name", "❌ El nombre del método de pago no puede estar vacío."),
        ("payment_method_not_found", "⚠️ Método de pago '{0}' no encontrado."),
        ("payment_method_not_found_list", "⚠️ Método de pago '{0}' no encontrado.\n\nMétodos disponibles:\n{1}"),
        ("payment_method_edit_usage", "❌ Uso: `/payment_methods edit <id> <campo> <valor>`\n\nCampos: name, type, closing_day, owner, active\nEjemplo: `/payment_methods edit 1 closing_day 20`"),
        ("payment_method_delete_usage", "❌ Uso: `/payment_methods delete <id>`"),
        ("payment_method_invalid_id", "❌ ID de método de pago inválido"),
        ("payment_method_updated", "✅ ¡Método de pago actualizado exitosamente!"),
        ("payment_method_deleted", "✅ ¡Método de pago eliminado exitosamente!"),
        ("payment_method_unknown_action", "❌ Acción desconocida. Usá: `add`, `edit`, o `delete`"),

        // Expenses
        ("expense_add_usage", "❌ Uso: `/add <monto> <descripción> [categoría] [método_pago] [quién_pagó]`\n\nEjemplos:\n`/add 50.00 Supermercado`\n`/add 25.50 Cena Comida Visa`\n`/add 25.50 Cena Comida Visa pareja`"),
        ("expense_invalid_amount", "❌ Monto inválido. Por favor proporcioná un número positivo."),
        ("expense_added", "✅ ¡Gasto #{0} agregado!\n\nMonto: {1}\nDescripción: {2}\n"),
        ("expense_category", "Categoría: {0}\n"),
        ("expense_payment_method", "Método de Pago: {0}\n"),
        ("expense_spender", "Pagó: {0}\n"),
        ("expense_billing_period", "Período de Facturación: {0} a {1}\n"),
        ("expense_list_none", "📋 No se encontraron gastos para {0}."),
        ("expense_list_header", "📋 *Gastos* ({0})\n\n"),
        ("expense_list_item", "• #{0} {1} - {2}\n"),
        ("expense_list_category", "  Categoría: {0}\n"),
        ("expense_list_date", "  Fecha: {0}\n\n"),
        ("expense_list_spender", "  Pagó: {0}\n"),
        ("expense_list_payment_method", "  Método de Pago: {0}\n"),
        ("expense_billing_item", "• #{0} {1} - {2} ({3})\n"),
        ("expense_delete_hint", "Usá `/delete <id_gasto>` para eliminar uno de ellos."),
        ("expense_list_total", "*Total: {0}*"),
        ("expense_no_description", "Sin descripción"),
        ("expense_billing_usage", "❌ Uso: `/list_billing <método_pago> [período]`\n\nEjemplo: `/list_billing Visa 2024-01`"),
        ("expense_billing_no_cycle", "❌ Este método de pago no tiene un ciclo de facturación configurado."),
        ("expense_billing_none", "📋 No se encontraron gastos para el período de facturación {0} a {1}."),
        ("expense_billing_header", "📋 *Gastos del Período de Facturación*\nMétodo de Pago: {0}\nPeríodo: {1} a {2}\n\n"),
        ("expense_delete_usage", "❌ Uso: `/delete <id_gasto>`\n\nEjemplo: `/delete 123`"),
        ("expense_delete_none", "📋 No se encontraron gastos para eliminar."),
        ("expense_delete_list_header", "📋 *Gastos Recientes (Últimos 10):*\n\n"),
        ("expense_delete_invalid_id", "❌ ID de gasto inválido. Uso: `/delete <id_gasto>`"),
        ("expense_not_found", "❌ Gasto no encontrado o no pertenece a tu lobby."),
        ("expense_deleted", "✅ ¡Gasto eliminado exitosamente!"),
        ("expense_edit_usage", "❌ Uso: `/edit <id_gasto> <campo> <valor>`\n\nCampos: `amount`, `description`, `category`, `date`, `payment_method`\n\nEjemplos:\n`/edit 123 category Supermercado`\n`/edit 123 payment_method Visa`"),
        ("expense_edit_invalid_id", "❌ ID de gasto inválido. Uso: `/edit <id_gasto> <campo> <valor>`"),
        ("expense_edit_invalid_field", "❌ Campo inválido. Usá `amount`, `description`, `category`, `date` o `payment_method`."),
        ("expense_edited", "✅ ¡Gasto actualizado exitosamente!"),

        // Settlement
        ("settle_usage", "❌ Uso: `/settle_billing <método_pago> [período]`\n\nEjemplo: `/settle_billing Visa 2024-01`"),
        ("settle_report", "💰 *Reporte de Liquidación*\n\nPeríodo: {0}\nTipo de Cuenta: {1}\nTotal de Gastos: {2}\n\n"),
        ("settle_separate", "*Cuentas Separadas (División Igual):*\n\n"),
        ("settle_shared", "*Cuenta Compartida (Basada en Sueldo):*\n\n"),
        ("settle_user1_spent", "Usuario 1 Gastó: {0}\n"),
        ("settle_user2_spent", "Usuario 2 Gastó: {0}\n\n"),
        ("settle_user1_expected", "Usuario 1 Esperado ({0}): {1}\n"),
        ("settle_user2_expected", "Usuario 2 Esperado ({0}): {1}\n\n"),
        ("settle_expected_per", "Esperado por persona: {0}\n\n"),
        ("settle_user1_owes", "➡️ Usuario 1 le debe a Usuario 2: {0}\n"),
        ("settle_user2_owes", "➡️ Usuario 2 le debe a Usuario 1: {0}\n"),
        ("settle_all_settled", "✅ ¡Todo saldado! Sin deudas.\n"),

        // Summary
        ("summary_none", "📊 *Resumen*\n\nNo se encontraron gastos para {0}."),
        ("summary_header", "📊 *Resumen de Gastos*\n\nPeríodo: {0}\nTotal de Gastos: {1}\nCantidad de Gastos: {2}\n\n"),
        ("summary_by_person", "*Por Persona:*\n"),
        ("summary_person_item", "{0}: {1} ({2})\n"),
        ("summary_by_category", "*Por Categoría:*\n"),
        ("summary_category_item", "• {0}: {1} ({2})\n"),
        ("summary_by_payment", "*Por Método de Pago:*\n"),
        ("summary_billing_usage", "❌ Uso: `/summary_billing <método_pago> [período]`\n\nEjemplo: `/summary_billing Visa 2024-01`"),
        ("summary_period", "el período seleccionado"),
        ("period_range", "{0} a {1}"),

        // Analysis
        ("analyze_header", "📈 *Análisis de Gastos Mensuales*\n\nPeríodo Actual: {0}\nPeríodo Anterior: {1}\n\n"),
        ("analyze_overall", "*Gastos Generales:*\n"),
        ("analyze_current", "Actual: {0}\n"),
        ("analyze_previous", "Anterior: {0}\n"),
        ("analyze_increase", "📈 Aumento: {0}\n\n"),
        ("analyze_decrease", "📉 Disminución: {0}\n\n"),
        ("analyze_no_change", "➡️ Sin cambios\n\n"),
        ("analyze_spikes", "*⚠️ Picos de Gasto (>20% de aumento):*\n"),
        ("analyze_spike_item", "• {0}: {1} (+{2})\n"),
        ("analyze_new_categories", "*🆕 Categorías Nuevas:*\n"),
        ("analyze_new_category", "• {0}\n"),
        ("analyze_discontinued", "*❌ Categorías Discontinuadas:*\n"),
        ("analyze_top_changes", "*Principales Cambios por Categoría:*\n"),
        ("analyze_change_item", "• {0}: {1} → {2} ({3})\n"),

        // Language
        ("language_current", "🌐 Idioma actual: {0}\n\nIdiomas disponibles:\n{1}"),
        ("language_changed", "✅ Idioma cambiado a {0}"),
        ("language_invalid", "❌ Código de idioma inválido. Disponibles: {0}"),

        // Invite
        ("invite_info", "🔗 *Token de Invitación*\n\n`{0}`\n\nTu pareja debería ejecutar:\n`/start {0}`"),
        ("invite_full", "✅ Tu lobby está completo. No hace falta invitación."),
        ("invite_group", "👥 En un grupo, tu pareja solo tiene que ejecutar `/start` acá."),
        ("invite_regenerated", "🔄 Nuevo token de invitación:\n\n`{0}`\n\nEl token anterior ya no funciona."),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(template: &str) -> Vec<usize> {
        let mut found: Vec<usize> = (0..10)
            .filter(|i| template.contains(&format!("{{{}}}", i)))
            .collect();
        found.dedup();
        found
    }

    #[test]
    fn test_fill_positional() {
        assert_eq!(fill("{0} owes {1}: {0}", &[&"Ana", &12.5]), "Ana owes 12.5: Ana");
        assert_eq!(fill("no args {x} {", &[]), "no args {x} {");
        assert_eq!(fill("{3}", &[&1]), "{3}");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        assert_eq!(fill("{0} and {1}", &[&"{1}", &"b"]), "{1} and b");
    }

    #[test]
    fn test_spanish_lookup() {
        let es = Translator::new(Language::SpanishArgentina);
        assert_eq!(es.tr("language_changed", &[&"es_AR"]), "✅ Idioma cambiado a es_AR");
    }

    #[test]
    fn test_fallback_to_english_then_key() {
        let es = Translator::new(Language::SpanishArgentina);
        // Only defined in English
        assert_eq!(es.t("language_prompt"), ENGLISH["language_prompt"]);
        assert_eq!(es.t("no_such_key"), "no_such_key");
    }

    #[test]
    fn test_tables_agree_on_keys_and_placeholders() {
        for (key, template) in SPANISH_AR.iter() {
            let english = ENGLISH
                .get(key)
                .unwrap_or_else(|| panic!("{} missing in English", key));
            assert_eq!(
                placeholders(template),
                placeholders(english),
                "placeholder mismatch for {}",
                key
            );
        }
    }

    #[test]
    fn test_settlement_line_en() {
        let en = Translator::new(Language::English);
        assert_eq!(en.tr("settle_user2_owes", &[&"25.00"]), "➡️ User 2 owes User 1: 25.00\n");
    }
}
