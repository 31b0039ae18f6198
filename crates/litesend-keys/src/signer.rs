//! Legacy P2PKH transaction signing for Litecoin.
//!
//! Litecoin shares Bitcoin's pre-segwit transaction format and signature
//! hash, so transactions are assembled with `bitcoin` types and signed
//! with `SIGHASH_ALL`.

use bitcoin::absolute::LockTime;
use bitcoin::ecdsa;
use bitcoin::hashes::Hash;
use bitcoin::script::PushBytesBuf;
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    consensus, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use litesend_core::constants::{Network, DUST_LIMIT};
use litesend_core::error::SignerError;
use litesend_core::traits::TransactionSigner;
use litesend_core::types::{KeyMaterial, SignedTransaction, TransactionRequest, TxOutputSpec};
use tracing::debug;

use crate::address::LitecoinAddress;
use crate::keys::SigningKey;

/// Signs payments with a single extended private key on one network.
pub struct LitecoinSigner {
    network: Network,
    secp: Secp256k1<All>,
}

impl LitecoinSigner {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            secp: Secp256k1::new(),
        }
    }

    /// The unsigned transaction: one input per UTXO in request order, the
    /// recipient output, then change when non-zero. Dust outputs are refused.
    fn assemble(
        &self,
        request: &TransactionRequest,
        own_script: &ScriptBuf,
    ) -> Result<Transaction, SignerError> {
        if request.inputs().is_empty() {
            return Err(SignerError::InvalidInput("no inputs".into()));
        }

        let mut input = Vec::with_capacity(request.inputs().len());
        for utxo in request.inputs() {
            let txid: Txid = utxo.txid.parse().map_err(|e| {
                SignerError::InvalidInput(format!("txid {:?}: {e}", utxo.txid))
            })?;
            if let Some(script_hex) = &utxo.script_pubkey {
                let bytes = hex::decode(script_hex).map_err(|e| {
                    SignerError::InvalidInput(format!("script of {}: {e}", utxo.outpoint()))
                })?;
                if ScriptBuf::from_bytes(bytes) != *own_script {
                    return Err(SignerError::InvalidInput(format!(
                        "{} is not locked to the signing key",
                        utxo.outpoint()
                    )));
                }
            }
            input.push(TxIn {
                previous_output: OutPoint::new(txid, utxo.output_index),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            });
        }

        let mut output = vec![self.tx_out(request.recipient())?];
        if request.change().amount.as_minor() > 0 {
            output.push(self.tx_out(request.change())?);
        }

        Ok(Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input,
            output,
        })
    }

    fn tx_out(&self, spec: &TxOutputSpec) -> Result<TxOut, SignerError> {
        if spec.amount.as_minor() < DUST_LIMIT {
            return Err(SignerError::InvalidInput(format!(
                "output of {} litoshis to {} is below the dust limit of {DUST_LIMIT}",
                spec.amount.as_minor(),
                spec.address
            )));
        }
        let address = LitecoinAddress::parse(&spec.address, self.network)?;
        Ok(TxOut {
            value: bitcoin::Amount::from_sat(spec.amount.as_minor()),
            script_pubkey: address.script_pubkey(),
        })
    }
}

impl TransactionSigner for LitecoinSigner {
    fn derive_address(&self, key: &KeyMaterial) -> Result<String, SignerError> {
        Ok(SigningKey::from_key_material(key, self.network)?
            .address()
            .to_string())
    }

    fn validate_address(&self, address: &str) -> Result<(), SignerError> {
        LitecoinAddress::parse(address, self.network).map(|_| ())
    }

    fn build_and_sign(
        &self,
        request: &TransactionRequest,
        key: &KeyMaterial,
    ) -> Result<SignedTransaction, SignerError> {
        let signing_key = SigningKey::from_key_material(key, self.network)?;
        let own_script = signing_key.address().script_pubkey();
        let mut tx = self.assemble(request, &own_script)?;

        // Legacy sighash blanks every other input's script, so all digests
        // can be taken before any scriptSig is filled in.
        let digests = {
            let cache = SighashCache::new(&tx);
            (0..tx.input.len())
                .map(|index| {
                    cache
                        .legacy_signature_hash(index, &own_script, EcdsaSighashType::All.to_u32())
                        .map(|h| h.to_byte_array())
                        .map_err(|e| SignerError::Signing(e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        for (txin, digest) in tx.input.iter_mut().zip(digests) {
            let signature = ecdsa::Signature {
                signature: signing_key.sign_digest(&self.secp, digest),
                sighash_type: EcdsaSighashType::All,
            };
            let push = PushBytesBuf::try_from(signature.to_vec())
                .map_err(|e| SignerError::Signing(e.to_string()))?;
            txin.script_sig = ScriptBuf::builder()
                .push_slice(push)
                .push_key(signing_key.public_key())
                .into_script();
        }

        let txid = tx.compute_txid().to_string();
        let raw_hex = consensus::encode::serialize_hex(&tx);
        debug!(
            %txid,
            inputs = tx.input.len(),
            outputs = tx.output.len(),
            bytes = raw_hex.len() / 2,
            "signer: signed transaction"
        );
        Ok(SignedTransaction { txid, raw_hex })
    }
}
