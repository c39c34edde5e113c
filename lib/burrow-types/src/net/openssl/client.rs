/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::time::Duration;

use anyhow::anyhow;
use openssl::pkey::PKey;
use openssl::ssl::{Ssl, SslConnector, SslContext, SslMethod, SslVerifyMode};
use openssl::x509::X509;
use openssl::x509::store::X509StoreBuilder;

use super::OpensslProtocol;
use crate::net::Host;

const MINIMAL_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(100);
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct OpensslClientConfig {
    disable_sni: bool,
    insecure_no_verify: bool,
    ssl_context: SslContext,
    pub handshake_timeout: Duration,
}

impl OpensslClientConfig {
    pub fn build_ssl(&self, tls_name: &Host, _port: u16) -> anyhow::Result<Ssl> {
        let mut ssl =
            Ssl::new(&self.ssl_context).map_err(|e| anyhow!("failed to get new Ssl state: {e}"))?;
        if self.insecure_no_verify {
            ssl.set_verify(SslVerifyMode::NONE);
        } else {
            let verify_param = ssl.param_mut();
            match tls_name {
                Host::Domain(domain) => {
                    verify_param
                        .set_host(domain)
                        .map_err(|e| anyhow!("failed to set cert verify domain: {e}"))?;
                }
                Host::Ip(ip) => {
                    verify_param
                        .set_ip(*ip)
                        .map_err(|e| anyhow!("failed to set cert verify ip: {e}"))?;
                }
            }
        }
        if !self.disable_sni {
            if let Host::Domain(domain) = tls_name {
                ssl.set_hostname(domain)
                    .map_err(|e| anyhow!("failed to set sni hostname: {e}"))?;
            }
        }
        Ok(ssl)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct OpensslClientConfigBuilder {
    min_protocol: Option<OpensslProtocol>,
    max_protocol: Option<OpensslProtocol>,
    ciphers: Vec<String>,
    disable_sni: bool,
    ca_certs: Vec<Vec<u8>>,
    no_default_ca_certs: bool,
    client_cert_pem: Option<Vec<u8>>,
    client_key_pem: Option<Vec<u8>>,
    insecure_no_verify: bool,
    handshake_timeout: Duration,
}

impl Default for OpensslClientConfigBuilder {
    fn default() -> Self {
        OpensslClientConfigBuilder {
            min_protocol: Some(OpensslProtocol::Tls1),
            max_protocol: Some(OpensslProtocol::Tls13),
            ciphers: Vec::new(),
            disable_sni: false,
            ca_certs: Vec::new(),
            no_default_ca_certs: false,
            client_cert_pem: None,
            client_key_pem: None,
            insecure_no_verify: false,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl OpensslClientConfigBuilder {
    pub fn check(&mut self) -> anyhow::Result<()> {
        if self.client_cert_pem.is_some() != self.client_key_pem.is_some() {
            return Err(anyhow!(
                "client certificate and private key should be set together"
            ));
        }

        if self.handshake_timeout < MINIMAL_HANDSHAKE_TIMEOUT {
            self.handshake_timeout = MINIMAL_HANDSHAKE_TIMEOUT;
        }

        Ok(())
    }

    pub fn set_protocol_range(
        &mut self,
        min: Option<OpensslProtocol>,
        max: Option<OpensslProtocol>,
    ) {
        self.min_protocol = min;
        self.max_protocol = max;
    }

    pub fn set_ciphers(&mut self, ciphers: Vec<String>) {
        self.ciphers = ciphers;
    }

    pub fn set_disable_sni(&mut self) {
        self.disable_sni = true;
    }

    pub fn set_ca_certificates(&mut self, certs: Vec<X509>) -> anyhow::Result<()> {
        let mut all_der = Vec::with_capacity(certs.len());
        for (i, cert) in certs.into_iter().enumerate() {
            let bytes = cert
                .to_der()
                .map_err(|e| anyhow!("failed to encode ca certificate #{i}: {e}"))?;
            all_der.push(bytes);
        }
        self.ca_certs = all_der;
        Ok(())
    }

    pub fn set_no_default_ca_certificates(&mut self) {
        self.no_default_ca_certs = true;
    }

    pub fn set_client_cert_pair(&mut self, cert_pem: Vec<u8>, key_pem: Vec<u8>) {
        self.client_cert_pem = Some(cert_pem);
        self.client_key_pem = Some(key_pem);
    }

    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }

    /// Skip certificate verification entirely. The legacy default of this
    /// engine's predecessor; kept as an explicit opt-in only.
    pub fn set_insecure_no_verify(&mut self) {
        self.insecure_no_verify = true;
    }

    pub fn build(&self) -> anyhow::Result<OpensslClientConfig> {
        let mut ctx_builder = SslConnector::builder(SslMethod::tls_client())
            .map_err(|e| anyhow!("failed to create ssl context builder: {e}"))?;

        if self.insecure_no_verify {
            ctx_builder.set_verify(SslVerifyMode::NONE);
        } else {
            ctx_builder.set_verify(SslVerifyMode::PEER);
        }

        ctx_builder
            .set_min_proto_version(self.min_protocol.map(|p| p.ssl_version()))
            .map_err(|e| anyhow!("failed to set min protocol version: {e}"))?;
        ctx_builder
            .set_max_proto_version(self.max_protocol.map(|p| p.ssl_version()))
            .map_err(|e| anyhow!("failed to set max protocol version: {e}"))?;

        if !self.ciphers.is_empty() {
            let cipher_list = self.ciphers.join(":");
            ctx_builder
                .set_cipher_list(&cipher_list)
                .map_err(|e| anyhow!("failed to set cipher list: {e}"))?;
        }

        if !self.ca_certs.is_empty() {
            let mut store_builder = X509StoreBuilder::new()
                .map_err(|e| anyhow!("failed to create ca cert store builder: {e}"))?;
            for (i, der) in self.ca_certs.iter().enumerate() {
                let cert = X509::from_der(der)
                    .map_err(|e| anyhow!("failed to decode ca certificate #{i}: {e}"))?;
                store_builder
                    .add_cert(cert)
                    .map_err(|e| anyhow!("failed to add ca certificate #{i}: {e}"))?;
            }
            ctx_builder
                .set_verify_cert_store(store_builder.build())
                .map_err(|e| anyhow!("failed to set ca cert store: {e}"))?;
        } else if !self.no_default_ca_certs {
            ctx_builder
                .set_default_verify_paths()
                .map_err(|e| anyhow!("failed to load default ca certificates: {e}"))?;
        }

        if let (Some(cert_pem), Some(key_pem)) = (&self.client_cert_pem, &self.client_key_pem) {
            let cert = X509::from_pem(cert_pem)
                .map_err(|e| anyhow!("failed to decode client certificate: {e}"))?;
            ctx_builder
                .set_certificate(&cert)
                .map_err(|e| anyhow!("failed to set client certificate: {e}"))?;
            let key = PKey::private_key_from_pem(key_pem)
                .map_err(|e| anyhow!("failed to decode client private key: {e}"))?;
            ctx_builder
                .set_private_key(&key)
                .map_err(|e| anyhow!("failed to set client private key: {e}"))?;
        }

        Ok(OpensslClientConfig {
            disable_sni: self.disable_sni,
            insecure_no_verify: self.insecure_no_verify,
            ssl_context: ctx_builder.build().into_context(),
            handshake_timeout: self.handshake_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_rejects_lone_cert() {
        let mut builder = OpensslClientConfigBuilder::default();
        builder.client_cert_pem = Some(Vec::new());
        assert!(builder.check().is_err());
    }

    #[test]
    fn check_clamps_handshake_timeout() {
        let mut builder = OpensslClientConfigBuilder::default();
        builder.set_handshake_timeout(Duration::from_millis(1));
        builder.check().unwrap();
        assert_eq!(builder.handshake_timeout, MINIMAL_HANDSHAKE_TIMEOUT);
    }
}
