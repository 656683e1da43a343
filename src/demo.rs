//! Built-in example workspace: an e-commerce platform.
//!
//! Used by `archdoc demo` and `archdoc build` to produce a working site
//! without any diagram-authoring code, and by the integration tests as a
//! realistic fixture. The model covers all three view kinds: a system
//! context view of the platform, a container view of its internals, and a
//! component view of the order service.

use crate::config::DiagramConfig;
use crate::generator::{DiagramGenerator, GeneratorError};
use crate::style;

/// Build the example e-commerce generator with views ready to export.
pub fn generator(config: DiagramConfig) -> Result<DiagramGenerator, GeneratorError> {
    let mut generator = DiagramGenerator::new(config)?;
    let ws = generator.workspace_mut();

    // People
    let customer = ws.add_person(
        "Customer",
        "A customer who browses products, places orders, and makes payments",
    )?;
    let admin = ws.add_person(
        "Administrator",
        "Manages products, orders, and system configuration",
    )?;

    // Systems
    let platform = ws.add_software_system(
        "E-Commerce Platform",
        "Allows customers to browse products, place orders, and make payments online",
    )?;
    let payment = ws.add_external_system(
        "Payment Gateway",
        "Processes credit card payments and handles payment security",
    )?;
    let email = ws.add_external_system(
        "Email Service",
        "Sends transactional emails like order confirmations",
    )?;

    // Containers
    let web_app = ws.add_container(
        platform,
        "Web Application",
        "Provides the shop functionality via a web browser",
        "React/TypeScript",
    )?;
    let api_gateway = ws.add_container(
        platform,
        "API Gateway",
        "Routes requests and handles authentication",
        "Node.js/Express",
    )?;
    let order_service = ws.add_container(
        platform,
        "Order Service",
        "Handles order processing, cart management, and checkout",
        "Java/Spring Boot",
    )?;
    let database = ws.add_container(
        platform,
        "Database",
        "Stores accounts, products, and orders",
        "PostgreSQL",
    )?;

    // Components of the order service
    let order_controller = ws.add_component(
        order_service,
        "Order Controller",
        "Handles HTTP requests for order operations",
        "REST Controller",
    )?;
    let order_processor = ws.add_component(
        order_service,
        "Order Processor",
        "Validates inventory and coordinates payment",
        "Service",
    )?;
    let payment_client = ws.add_component(
        order_service,
        "Payment Client",
        "Integrates with the external payment gateway",
        "HTTP Client",
    )?;
    let order_repository = ws.add_component(
        order_service,
        "Order Repository",
        "Persists orders and cart items",
        "Data Access",
    )?;

    // Relationships
    ws.relate(customer, platform, "Browses products, places orders")?;
    ws.relate(admin, platform, "Manages products and orders")?;
    ws.relate_via(platform, payment, "Processes payments", "HTTPS/REST")?;
    ws.relate_via(platform, email, "Sends order confirmations", "SMTP")?;
    ws.relate(customer, web_app, "Places orders using")?;
    ws.relate(admin, web_app, "Manages the catalog using")?;
    ws.relate_via(web_app, api_gateway, "Makes API calls to", "HTTPS/JSON")?;
    ws.relate_via(api_gateway, order_service, "Routes order requests to", "HTTP/REST")?;
    ws.relate_via(order_service, database, "Reads from and writes to", "SQL/TCP")?;
    ws.relate_via(api_gateway, order_controller, "Routes order requests to", "HTTP/REST")?;
    ws.relate(order_controller, order_processor, "Processes orders via")?;
    ws.relate(order_processor, payment_client, "Charges cards via")?;
    ws.relate(order_processor, order_repository, "Persists orders via")?;
    ws.relate_via(order_repository, database, "Reads from and writes to", "JDBC/SQL")?;
    ws.relate_via(payment_client, payment, "Makes payment requests to", "HTTPS/REST")?;

    // Views
    let context = generator.add_system_context_view(
        platform,
        "E-Commerce System Context",
        "The platform, its users, and the systems it integrates with",
    )?;
    generator.include(context, &[customer, admin, platform, payment, email])?;

    let containers = generator.add_container_view(
        platform,
        "E-Commerce Containers",
        "The applications and data stores inside the platform",
    )?;
    generator.include(
        containers,
        &[customer, admin, web_app, api_gateway, order_service, database, payment],
    )?;

    let components = generator.add_component_view(
        order_service,
        "Order Service Components",
        "How the order service is assembled",
    )?;
    generator.include(
        components,
        &[
            api_gateway,
            database,
            payment,
            order_controller,
            order_processor,
            payment_client,
            order_repository,
        ],
    )?;

    for view in [context, containers, components] {
        style::apply_theme(generator.workspace_mut(), view, "corporate")?;
    }

    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewKind;

    #[test]
    fn demo_builds_all_three_view_kinds() {
        let generator = generator(DiagramConfig::default()).unwrap();
        let kinds: Vec<ViewKind> = generator.workspace().views().iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![ViewKind::SystemContext, ViewKind::Container, ViewKind::Component]
        );
    }

    #[test]
    fn demo_views_are_styled_and_populated() {
        let generator = generator(DiagramConfig::default()).unwrap();
        for view in generator.workspace().views() {
            assert!(view.style.is_some(), "view {} is unstyled", view.key);
            assert!(!view.includes.is_empty(), "view {} is empty", view.key);
        }
        assert!(generator.workspace().relationships().len() >= 10);
    }
}
